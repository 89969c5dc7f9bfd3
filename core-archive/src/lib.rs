//! # Narration Archive Module
//!
//! Local persistence of saved narrations and the current editing session.
//! Data lives as plain JSON blobs keyed by fixed string identifiers in the
//! host [`SettingsStore`](bridge_traits::storage::SettingsStore) — the
//! platform analog of browser local storage. The audio core neither reads
//! nor writes this store; only the repository here does.

pub mod error;
pub mod repository;

pub use error::{ArchiveError, Result};
pub use repository::{
    derive_title, ArchiveRepository, NarrationRecord, NarrationSession, ARCHIVE_KEY, SESSION_KEY,
};
