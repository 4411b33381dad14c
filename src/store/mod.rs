//! Persistence layer
//!
//! Every domain operation reads and writes through the [`Repository`] trait;
//! [`InMemoryRepository`] is the bundled implementation.

pub mod memory;
pub mod repository;

pub use memory::{InMemoryRepository, MemoryTables};
pub use repository::{
    require_active_profile, require_game, require_profile, require_session, DataAccess,
    Repository, StoreStats,
};
