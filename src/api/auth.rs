//! Request authentication
//!
//! Every request presents the shared API token as `Authorization: Token <t>`.
//! Requests acting for a profile also name it with `X-Profile-Id`, which
//! becomes the [`RequestContext`] identity.

use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::error::MeshwellError;
use crate::types::{ProfileId, RequestContext};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

pub const PROFILE_HEADER: &str = "x-profile-id";

/// Proof that the request carried a valid API token
#[derive(Debug, Clone, Copy)]
pub struct Authenticated;

/// Authenticated request acting for one profile
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub RequestContext);

fn check_token(parts: &Parts, expected: &str) -> Result<(), MeshwellError> {
    let presented = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Token "))
        .map(str::trim);

    match presented {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(MeshwellError::unauthorized("Invalid token")),
        None => Err(MeshwellError::unauthorized(
            "Authentication credentials were not provided",
        )),
    }
}

fn profile_id(parts: &Parts) -> Result<ProfileId, MeshwellError> {
    let raw = parts
        .headers
        .get(PROFILE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| MeshwellError::unauthorized("Missing X-Profile-Id header"))?;

    raw.trim()
        .parse()
        .map_err(|_| MeshwellError::unauthorized("Malformed X-Profile-Id header"))
}

impl FromRequestParts<ApiState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        check_token(parts, state.token())?;
        Ok(Authenticated)
    }
}

impl FromRequestParts<ApiState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        check_token(parts, state.token())?;
        let profile_id = profile_id(parts)?;
        Ok(Caller(RequestContext::new(profile_id)))
    }
}
