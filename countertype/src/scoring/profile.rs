//! Contributor profiles and their export format.
//!
//! In memory, sets and maps use ordered containers and the history is a
//! bounded ring. The export record flattens those into plain sequences and
//! a JSON object so it can be persisted or shipped elsewhere.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Achievement, Level, Specialization};

/// Number of recent attempts kept per contributor.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// One scored attempt, as remembered by a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub pattern: String,
    pub escaped: bool,
    pub resilience: u64,
    pub timestamp: DateTime<Utc>,
}

/// Running state for one contributor.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributorProfile {
    pub id: String,
    /// Never decreases.
    pub total_resilience: u64,
    pub level: Level,
    pub recognized_patterns: BTreeSet<String>,
    pub pattern_exposures: BTreeMap<String, u32>,
    /// Oldest first.
    pub escape_history: VecDeque<HistoryEntry>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub specializations: BTreeSet<Specialization>,
    pub achievements: BTreeSet<Achievement>,
    pub created_at: DateTime<Utc>,
}

impl ContributorProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            total_resilience: 0,
            level: Level::Apprentice,
            recognized_patterns: BTreeSet::new(),
            pattern_exposures: BTreeMap::new(),
            escape_history: VecDeque::new(),
            current_streak: 0,
            longest_streak: 0,
            specializations: BTreeSet::new(),
            achievements: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Times this contributor has been exposed to `pattern`.
    pub fn exposure_count(&self, pattern: &str) -> u32 {
        self.pattern_exposures.get(pattern).copied().unwrap_or(0)
    }

    pub fn has_recognized(&self, pattern: &str) -> bool {
        self.recognized_patterns.contains(pattern)
    }

    pub(crate) fn record_exposure(&mut self, pattern: &str) {
        *self
            .pattern_exposures
            .entry(pattern.to_string())
            .or_insert(0) += 1;
    }

    pub(crate) fn record_streak(&mut self, escaped: bool) {
        if escaped {
            self.current_streak += 1;
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    /// Append to the history, evicting the oldest entries beyond `limit`.
    pub(crate) fn push_history(&mut self, entry: HistoryEntry, limit: usize) {
        self.escape_history.push_back(entry);
        while self.escape_history.len() > limit {
            self.escape_history.pop_front();
        }
    }

    /// Convert to the export format.
    pub fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            id: self.id.clone(),
            total_resilience: self.total_resilience,
            level: self.level,
            recognized_patterns: self.recognized_patterns.iter().cloned().collect(),
            pattern_exposures: self.pattern_exposures.clone(),
            escape_history: self.escape_history.iter().cloned().collect(),
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            specializations: self.specializations.iter().copied().collect(),
            achievements: self.achievements.iter().copied().collect(),
            created_at: self.created_at,
        }
    }

    /// Rebuild from the export format. The level is recomputed from the
    /// total and the history is trimmed to `history_limit`.
    pub fn from_record(record: ProfileRecord, history_limit: usize) -> Self {
        let mut escape_history: VecDeque<HistoryEntry> = record.escape_history.into();
        while escape_history.len() > history_limit {
            escape_history.pop_front();
        }

        Self {
            id: record.id,
            total_resilience: record.total_resilience,
            level: Level::for_resilience(record.total_resilience),
            recognized_patterns: record.recognized_patterns.into_iter().collect(),
            pattern_exposures: record.pattern_exposures,
            escape_history,
            current_streak: record.current_streak,
            longest_streak: record.longest_streak.max(record.current_streak),
            specializations: record.specializations.into_iter().collect(),
            achievements: record.achievements.into_iter().collect(),
            created_at: record.created_at,
        }
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id.clone(),
            total_resilience: self.total_resilience,
            level: self.level,
            longest_streak: self.longest_streak,
            achievement_count: self.achievements.len(),
            specialization_count: self.specializations.len(),
        }
    }
}

/// Serializable snapshot of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    #[serde(default)]
    pub total_resilience: u64,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub recognized_patterns: Vec<String>,
    #[serde(default)]
    pub pattern_exposures: BTreeMap<String, u32>,
    #[serde(default)]
    pub escape_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub specializations: Vec<Specialization>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: String,
    pub total_resilience: u64,
    pub level: Level,
    pub longest_streak: u32,
    pub achievement_count: usize,
    pub specialization_count: usize,
}
