//! countertype: false-certainty injection and resilience scoring.
//!
//! This library provides:
//! - A reasoning tree model whose unknown fields survive transforms verbatim
//! - The certainty cascade injector, which corrupts a tree with false
//!   certainty and records what it hid
//! - An escape detector that judges whether a response counteracts it
//! - A resilience scoring engine that scores escape attempts and evolves a
//!   per-contributor profile (level, streaks, specializations, achievements)
//!
//! # Usage
//!
//! ```
//! use countertype::{
//!     CertaintyCascadeInjector, EscapeAttempt, EvidenceItem, InjectionConfig, ProfileStore,
//!     ReasoningNode, ResilienceEngine,
//! };
//!
//! let node = ReasoningNode::new("the data points one way")
//!     .with_certainty(0.6)
//!     .with_evidence(EvidenceItem::new("X", 0.8))
//!     .with_evidence(EvidenceItem::new("Y", 0.2));
//!
//! let config = InjectionConfig { seed: Some(7), ..Default::default() };
//! let injected = CertaintyCascadeInjector::new(config).inject(&node);
//! assert_eq!(injected.certainty, 0.92);
//!
//! let engine = ResilienceEngine::new(ProfileStore::new().shared());
//! let result = engine
//!     .score_escape("ada", &EscapeAttempt::new("certainty_cascade"))
//!     .unwrap();
//! assert_eq!(result.total_resilience, result.resilience);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod injector;
pub mod pattern;
pub mod reasoning;
pub mod scoring;

pub use config::{ConfigError, ConfigResult, CountertypeConfig};

// Re-export key injection types
pub use injector::{
    detect_escape, provide_hints, CertaintyCascadeInjector, EscapeMethod, EscapeSignals,
    EscapeVerdict, InjectionConfig,
};

// Re-export key model types
pub use pattern::{complexity_multiplier, PatternKind};
pub use reasoning::{DetectionMetadata, EvidenceItem, ReasoningNode};

// Re-export key scoring types
pub use scoring::{
    check_advancement, Achievement, Advancement, ContributorProfile, EscapeAttempt, HistoryEntry,
    Level, ProfileRecord, ProfileStore, ProfileSummary, ResilienceEngine, ScoreBreakdown,
    ScoreResult, ScoringConfig, ScoringError, ScoringResult, SharedProfileStore, Specialization,
    SynthesisType,
};
