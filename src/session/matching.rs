//! Queue matching algorithms
//!
//! This module decides which compatible open session a queueing profile
//! joins, or that a new session has to be created.

use crate::error::Result;
use crate::types::{Profile, Session, SessionId};

/// An open session a profile could join, with its current participants
#[derive(Debug, Clone)]
pub struct Candidate {
    pub session: Session,
    pub participants: Vec<Profile>,
}

/// Result of a queue matching operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchingResult {
    /// Profile should join an existing session
    MatchedToSession(SessionId),
    /// No candidate fits, a new session should be created
    CreateNewSession,
}

/// Trait for queue matching algorithms
pub trait SessionMatcher: Send + Sync {
    /// Pick the session `profile` should join from pre-filtered candidates
    fn find_session_for_profile(
        &self,
        profile: &Profile,
        candidates: &[Candidate],
    ) -> Result<MatchingResult>;

    /// Score how well a candidate suits the profile (higher = better fit)
    fn score_candidate(&self, profile: &Profile, candidate: &Candidate) -> f64;
}

/// Matcher driven by the queueing profile's commendation priorities
///
/// Each participant contributes its commendation rate per kind (commends
/// received per rating received). Rates are weighted by the slot the kind
/// holds in the queueing profile's priority order and averaged over the
/// participants. Profiles that ignore matchmaking take the earliest session.
#[derive(Debug, Clone)]
pub struct PreferenceMatcher {
    weights: [f64; 4],
}

impl PreferenceMatcher {
    pub fn new(weights: [f64; 4]) -> Self {
        Self { weights }
    }

    fn participant_score(&self, priorities: &Profile, participant: &Profile) -> f64 {
        if participant.received_ratings == 0 {
            return 0.0;
        }
        let ratings = participant.received_ratings as f64;

        priorities
            .commend_priorities
            .iter()
            .zip(self.weights.iter())
            .map(|(commend, weight)| weight * participant.commends.get(*commend) as f64 / ratings)
            .sum()
    }
}

impl Default for PreferenceMatcher {
    fn default() -> Self {
        Self::new([4.0, 3.0, 2.0, 1.0])
    }
}

impl SessionMatcher for PreferenceMatcher {
    fn find_session_for_profile(
        &self,
        profile: &Profile,
        candidates: &[Candidate],
    ) -> Result<MatchingResult> {
        let best = if profile.ignore_matchmaking {
            candidates.iter().min_by_key(|c| c.session.start)
        } else {
            let mut best: Option<(&Candidate, f64)> = None;
            for candidate in candidates {
                let score = self.score_candidate(profile, candidate);
                let better = match best {
                    None => true,
                    Some((current, current_score)) => {
                        score > current_score
                            || (score == current_score
                                && candidate.session.start < current.session.start)
                    }
                };
                if better {
                    best = Some((candidate, score));
                }
            }
            best.map(|(candidate, _)| candidate)
        };

        Ok(match best {
            Some(candidate) => MatchingResult::MatchedToSession(candidate.session.id),
            None => MatchingResult::CreateNewSession,
        })
    }

    fn score_candidate(&self, profile: &Profile, candidate: &Candidate) -> f64 {
        if candidate.participants.is_empty() {
            return 0.0;
        }
        let total: f64 = candidate
            .participants
            .iter()
            .map(|participant| self.participant_score(profile, participant))
            .sum();
        total / candidate.participants.len() as f64
    }
}
