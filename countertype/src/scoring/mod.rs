//! Resilience scoring: turns escape attempts into a running contributor
//! profile.
//!
//! # Level ladder
//!
//! ```text
//! apprentice ──26──► journeyman ──76──► artisan ──151──► master
//! ```
//!
//! Levels are a pure function of cumulative resilience and only move up.
//!
//! # Ownership
//!
//! [`ProfileStore`] holds the profiles; [`ResilienceEngine`] is their only
//! writer. Export and import go through [`ProfileRecord`], which flattens
//! sets and maps into plain sequences and objects.

pub mod engine;
pub mod error;
pub mod profile;
pub mod store;
pub mod types;

pub use engine::{check_advancement, ResilienceEngine, ScoringConfig};
pub use error::{ScoringError, ScoringResult};
pub use profile::{ContributorProfile, HistoryEntry, ProfileRecord, ProfileSummary};
pub use store::{ProfileStore, SharedProfileStore};
pub use types::{
    Achievement, Advancement, EscapeAttempt, Level, ScoreBreakdown, ScoreResult, Specialization,
    SynthesisType,
};
