//! Known pattern identifiers and their scoring weights.

use serde::{Deserialize, Serialize};

/// A named corruption strategy.
///
/// Attempts refer to patterns by identifier string; identifiers not listed
/// here are accepted everywhere and score with a neutral multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    BinaryTrap,
    CertaintyCascade,
    TautologyLoop,
    MetaTrap,
    RecursiveSynthesisTrap,
}

impl PatternKind {
    pub fn all() -> &'static [PatternKind] {
        &[
            Self::BinaryTrap,
            Self::CertaintyCascade,
            Self::TautologyLoop,
            Self::MetaTrap,
            Self::RecursiveSynthesisTrap,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::BinaryTrap => "binary_trap",
            Self::CertaintyCascade => "certainty_cascade",
            Self::TautologyLoop => "tautology_loop",
            Self::MetaTrap => "meta_trap",
            Self::RecursiveSynthesisTrap => "recursive_synthesis_trap",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.id() == id)
    }

    /// How much harder this pattern is to escape than a binary trap.
    pub fn complexity_multiplier(&self) -> f64 {
        match self {
            Self::BinaryTrap => 1.0,
            Self::CertaintyCascade => 1.2,
            Self::TautologyLoop => 1.4,
            Self::MetaTrap => 1.8,
            Self::RecursiveSynthesisTrap => 2.0,
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Complexity multiplier for a pattern identifier (1.0 when unknown).
pub fn complexity_multiplier(pattern: &str) -> f64 {
    PatternKind::from_id(pattern).map_or(1.0, |p| p.complexity_multiplier())
}
