//! Resilience Scoring Engine: scores escape attempts and evolves profiles.
//!
//! ```text
//! composite = round((recognition + velocity + elegance + meta + synthesis + immunity)
//!                   × complexity_multiplier × streak_bonus)
//! ```
//!
//! Every read of prior profile state (exposures, recognized set, streak)
//! happens before the profile is updated with this attempt.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{ScoringError, ScoringResult};
use super::profile::{
    ContributorProfile, HistoryEntry, ProfileRecord, ProfileSummary, DEFAULT_HISTORY_LIMIT,
};
use super::store::SharedProfileStore;
use super::types::{
    Achievement, Advancement, EscapeAttempt, Level, ScoreBreakdown, ScoreResult, Specialization,
    SynthesisType,
};
use crate::injector::detector::EscapeMethod;
use crate::pattern::complexity_multiplier;

const VELOCITY_CAP: f64 = 10.0;
const SUBTLE_PATTERN: f64 = 0.7;
const HUNTER_SUBTLETY: f64 = 0.8;
const PERFECT_STREAK: u32 = 10;
const COLLECTOR_PATTERNS: usize = 5;

/// Scoring knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Escape time (ms) that earns a middling velocity score.
    pub baseline_time_ms: f64,
    /// Creativity above this earns the elegance bonus.
    pub elegance_threshold: f64,
    /// Attempts remembered per profile.
    pub history_limit: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            baseline_time_ms: 60_000.0,
            elegance_threshold: 0.7,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl ScoringConfig {
    /// Copy with unusable values replaced. A baseline that is not a positive
    /// finite number falls back to the default, and at least one history
    /// entry is kept.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let baseline_time_ms = if self.baseline_time_ms.is_finite() && self.baseline_time_ms > 0.0 {
            self.baseline_time_ms
        } else {
            defaults.baseline_time_ms
        };
        let elegance_threshold = if self.elegance_threshold.is_nan() {
            defaults.elegance_threshold
        } else {
            self.elegance_threshold
        };
        Self {
            baseline_time_ms,
            elegance_threshold,
            history_limit: self.history_limit.max(1),
        }
    }
}

/// Scores attempts against a [`ProfileStore`](super::ProfileStore).
///
/// The engine is the only writer of profiles. It is `Send + Sync`; calls for
/// the same contributor serialize on that contributor's lock.
pub struct ResilienceEngine {
    store: SharedProfileStore,
    config: ScoringConfig,
}

impl ResilienceEngine {
    pub fn new(store: SharedProfileStore) -> Self {
        Self::with_config(store, ScoringConfig::default())
    }

    pub fn with_config(store: SharedProfileStore, config: ScoringConfig) -> Self {
        Self {
            store,
            config: config.sanitized(),
        }
    }

    pub fn store(&self) -> &SharedProfileStore {
        &self.store
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score `attempt` for `contributor_id`, creating the profile on first
    /// use, and apply the attempt to the profile.
    pub fn score_escape(
        &self,
        contributor_id: &str,
        attempt: &EscapeAttempt,
    ) -> ScoringResult<ScoreResult> {
        let handle = self.store.get_or_create(contributor_id)?;
        let mut profile = handle
            .lock()
            .map_err(|_| ScoringError::LockPoisoned(contributor_id.to_string()))?;

        let prior_exposures = profile.exposure_count(&attempt.pattern);
        let first_recognition = !profile.has_recognized(&attempt.pattern);
        let first_attempt =
            profile.escape_history.is_empty() && profile.pattern_exposures.is_empty();

        let breakdown = ScoreBreakdown {
            recognition: recognition_score(attempt, first_recognition),
            velocity: velocity_score(attempt.escape_time, self.config.baseline_time_ms),
            elegance: elegance_score(attempt, self.config.elegance_threshold),
            meta_awareness: meta_awareness_score(attempt),
            synthesis: synthesis_score(attempt),
            immunity: immunity_score(attempt.escaped, prior_exposures),
        };
        let multiplier = complexity_multiplier(&attempt.pattern);
        let bonus = streak_bonus(profile.current_streak);
        let resilience = composite(&breakdown, multiplier, bonus);

        profile.record_exposure(&attempt.pattern);
        if attempt.pattern_recognized {
            profile.recognized_patterns.insert(attempt.pattern.clone());
        }
        profile.record_streak(attempt.escaped);
        profile.push_history(
            HistoryEntry {
                pattern: attempt.pattern.clone(),
                escaped: attempt.escaped,
                resilience,
                timestamp: Utc::now(),
            },
            self.config.history_limit,
        );

        let new_specializations = award_specializations(&mut profile, &breakdown, attempt);
        let new_achievements =
            award_achievements(&mut profile, &breakdown, attempt, first_attempt);

        profile.total_resilience += resilience;
        let advancement = check_advancement(profile.level, profile.total_resilience);
        if let Some(ref adv) = advancement {
            profile.level = adv.to;
            info!(
                contributor = %contributor_id,
                from = %adv.from,
                to = %adv.to,
                total = profile.total_resilience,
                "Contributor advanced"
            );
        }

        debug!(
            contributor = %contributor_id,
            pattern = %attempt.pattern,
            base = breakdown.base(),
            multiplier,
            streak_bonus = bonus,
            resilience,
            total = profile.total_resilience,
            "Scored escape attempt"
        );

        Ok(ScoreResult {
            contributor_id: contributor_id.to_string(),
            resilience,
            breakdown,
            complexity_multiplier: multiplier,
            streak_bonus: bonus,
            total_resilience: profile.total_resilience,
            level: profile.level,
            advancement,
            new_achievements,
            new_specializations,
        })
    }

    /// Up to `limit` profile summaries, highest total first.
    pub fn leaderboard(&self, limit: usize) -> ScoringResult<Vec<ProfileSummary>> {
        let mut summaries: Vec<ProfileSummary> = self
            .store
            .snapshot_all()?
            .iter()
            .map(ContributorProfile::summary)
            .collect();
        summaries.sort_by(|a, b| {
            b.total_resilience
                .cmp(&a.total_resilience)
                .then_with(|| a.id.cmp(&b.id))
        });
        summaries.truncate(limit);
        Ok(summaries)
    }

    /// Export record for `contributor_id`, or `None` if unknown.
    pub fn export_profile(&self, contributor_id: &str) -> ScoringResult<Option<ProfileRecord>> {
        Ok(self
            .store
            .get(contributor_id)?
            .map(|profile| profile.to_record()))
    }

    /// Install a profile from an export record, replacing any existing one.
    pub fn import_profile(&self, record: ProfileRecord) -> ScoringResult<()> {
        let stored_level = record.level;
        let profile = ContributorProfile::from_record(record, self.config.history_limit);
        if profile.level != stored_level {
            warn!(
                contributor = %profile.id,
                stored = %stored_level,
                derived = %profile.level,
                "Imported level disagrees with total resilience; using derived level"
            );
        }
        info!(contributor = %profile.id, total = profile.total_resilience, "Imported profile");
        self.store.insert(profile)
    }

    /// Copy of the current profile for `contributor_id`.
    pub fn profile(&self, contributor_id: &str) -> ScoringResult<Option<ContributorProfile>> {
        self.store.get(contributor_id)
    }
}

/// Level change implied by moving from `current` to the level for `total`.
/// Levels never regress.
pub fn check_advancement(current: Level, total: u64) -> Option<Advancement> {
    let next = Level::for_resilience(total);
    if next <= current {
        return None;
    }
    Some(Advancement {
        advanced: true,
        from: current,
        to: next,
        unlocked_affordances: next.affordances().iter().map(|a| a.to_string()).collect(),
    })
}

fn recognition_score(attempt: &EscapeAttempt, first_recognition: bool) -> i32 {
    if !attempt.pattern_recognized {
        return 0;
    }
    let mut score = 5;
    if first_recognition {
        score += 3;
    }
    if attempt.pattern_subtlety > SUBTLE_PATTERN {
        score += 2;
    }
    score
}

/// Faster escapes score logarithmically higher, capped at 10. Missing or
/// non-positive times score 1.
fn velocity_score(escape_time: Option<f64>, baseline_ms: f64) -> i32 {
    match escape_time {
        Some(ms) if ms > 0.0 && ms.is_finite() => {
            let raw = ((baseline_ms / ms + 1.0).log2() * 2.0).min(VELOCITY_CAP);
            raw.max(0.0).round() as i32
        }
        _ => 1,
    }
}

fn elegance_score(attempt: &EscapeAttempt, threshold: f64) -> i32 {
    let mut score = match attempt.escape_method {
        EscapeMethod::Synthesis => 3,
        EscapeMethod::Recognition => 1,
        EscapeMethod::Trapped => 0,
    };
    if attempt.creativity > threshold {
        score += 2;
    }
    if attempt.brute_force {
        score -= 1;
    }
    score.max(0)
}

fn meta_awareness_score(attempt: &EscapeAttempt) -> i32 {
    if !attempt.meta_awareness {
        return 0;
    }
    let mut score = 7;
    if attempt.understood_purpose {
        score += 3;
    }
    if attempt.self_reflection {
        score += 2;
    }
    if attempt.teaching_moment {
        score += 5;
    }
    score
}

fn synthesis_score(attempt: &EscapeAttempt) -> i32 {
    if !attempt.synthesized {
        return 0;
    }
    4 + attempt.synthesis_type.map_or(0, |t| t.bonus())
}

/// `prior_exposures` is the count before this attempt is recorded.
fn immunity_score(escaped: bool, prior_exposures: u32) -> i32 {
    if prior_exposures == 0 {
        0
    } else if escaped {
        (5 - prior_exposures.min(5) as i32).max(1)
    } else {
        -2
    }
}

/// Bonus for the streak held before this attempt.
fn streak_bonus(streak: u32) -> f64 {
    match streak {
        s if s >= 10 => 1.5,
        s if s >= 5 => 1.3,
        s if s >= 3 => 1.1,
        _ => 1.0,
    }
}

/// Composite score, floored at zero so totals never fall.
fn composite(breakdown: &ScoreBreakdown, multiplier: f64, bonus: f64) -> u64 {
    let score = (f64::from(breakdown.base()) * multiplier * bonus).round();
    score.max(0.0) as u64
}

fn award_specializations(
    profile: &mut ContributorProfile,
    breakdown: &ScoreBreakdown,
    attempt: &EscapeAttempt,
) -> Vec<Specialization> {
    let earned = [
        (
            Specialization::SynthesisMaster,
            breakdown.synthesis >= 7 && attempt.synthesis_type == Some(SynthesisType::Emergent),
        ),
        (Specialization::VelocityDemon, breakdown.velocity >= 8),
        (
            Specialization::PatternHunter,
            breakdown.recognition >= 8 && attempt.pattern_subtlety > HUNTER_SUBTLETY,
        ),
        (Specialization::MetaMaster, breakdown.meta_awareness >= 15),
    ];

    earned
        .into_iter()
        .filter(|(_, met)| *met)
        .filter_map(|(spec, _)| profile.specializations.insert(spec).then_some(spec))
        .collect()
}

/// Runs after the streak and history have been updated. `first_attempt` is
/// read before the profile saw this attempt.
fn award_achievements(
    profile: &mut ContributorProfile,
    breakdown: &ScoreBreakdown,
    attempt: &EscapeAttempt,
    first_attempt: bool,
) -> Vec<Achievement> {
    let earned = [
        (Achievement::FirstEscape, attempt.escaped && first_attempt),
        (
            Achievement::PerfectTen,
            profile.current_streak == PERFECT_STREAK,
        ),
        (
            Achievement::PatternCollector,
            profile.recognized_patterns.len() >= COLLECTOR_PATTERNS,
        ),
        (Achievement::Teacher, attempt.teaching_moment),
        (
            Achievement::LightningEscape,
            breakdown.velocity == VELOCITY_CAP as i32,
        ),
    ];

    earned
        .into_iter()
        .filter(|(_, met)| *met)
        .filter_map(|(achievement, _)| {
            profile
                .achievements
                .insert(achievement)
                .then_some(achievement)
        })
        .collect()
}
