//! Connected game accounts and rank lookup

pub mod connect;
pub mod ranks;

pub use connect::{AccountRequest, AccountService};
pub use ranks::{RankLookup, RankProvider, RankQuery, StaticRankProvider};
