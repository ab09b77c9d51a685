//! Scoring inputs and outputs.

use schemars::JsonSchema;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::injector::detector::{EscapeMethod, EscapeVerdict};

/// A contributor's response to an injected node, as judged by the escape
/// detector or a human scorer. Consumed once by the scoring engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EscapeAttempt {
    /// Pattern identifier (e.g. `"certainty_cascade"`).
    pub pattern: String,
    pub pattern_recognized: bool,
    /// How subtle this instance of the pattern was, in [0, 1].
    pub pattern_subtlety: f64,
    /// Time to escape in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape_time: Option<f64>,
    pub escape_method: EscapeMethod,
    /// In [0, 1].
    pub creativity: f64,
    pub brute_force: bool,
    pub meta_awareness: bool,
    pub understood_purpose: bool,
    pub self_reflection: bool,
    pub teaching_moment: bool,
    pub synthesized: bool,
    /// `"none"` reads as no synthesis type.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_synthesis_type"
    )]
    #[schemars(with = "Option<SynthesisType>")]
    pub synthesis_type: Option<SynthesisType>,
    pub escaped: bool,
}

impl EscapeAttempt {
    /// An attempt on `pattern` with every signal off.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    /// Seed an attempt from a detector verdict. Anything the detector cannot
    /// judge (timing, creativity, meta signals) is left off.
    pub fn from_verdict(pattern: impl Into<String>, verdict: &EscapeVerdict) -> Self {
        Self {
            pattern_recognized: verdict.escaped,
            escape_method: verdict.escape_method,
            escaped: verdict.escaped,
            ..Self::new(pattern)
        }
    }
}

/// Kind of synthesis reached when escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisType {
    Dialectical,
    Paradoxical,
    Emergent,
}

const SYNTHESIS_TYPE_NAMES: &[&str] = &["dialectical", "paradoxical", "emergent", "none"];

fn deserialize_synthesis_type<'de, D>(deserializer: D) -> Result<Option<SynthesisType>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Known(SynthesisType),
        Other(String),
    }

    match Option::<Wire>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Wire::Known(kind)) => Ok(Some(kind)),
        Some(Wire::Other(name)) if name.eq_ignore_ascii_case("none") => Ok(None),
        Some(Wire::Other(name)) => Err(de::Error::unknown_variant(&name, SYNTHESIS_TYPE_NAMES)),
    }
}

impl SynthesisType {
    pub fn bonus(&self) -> i32 {
        match self {
            Self::Dialectical => 3,
            Self::Paradoxical => 5,
            Self::Emergent => 7,
        }
    }
}

/// Contributor level. Ordered; a profile's level never moves backwards.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[default]
    Apprentice,
    Journeyman,
    Artisan,
    Master,
}

impl Level {
    /// Total resilience needed to reach this level.
    pub fn threshold(&self) -> u64 {
        match self {
            Self::Apprentice => 0,
            Self::Journeyman => 26,
            Self::Artisan => 76,
            Self::Master => 151,
        }
    }

    pub fn for_resilience(total: u64) -> Self {
        [Self::Master, Self::Artisan, Self::Journeyman]
            .into_iter()
            .find(|level| total >= level.threshold())
            .unwrap_or(Self::Apprentice)
    }

    /// Capabilities unlocked on reaching this level.
    pub fn affordances(&self) -> &'static [&'static str] {
        match self {
            Self::Apprentice => &[],
            Self::Journeyman => &["pattern_variations", "peer_review"],
            Self::Artisan => &["pattern_composition", "custom_challenges", "mentorship"],
            Self::Master => &[
                "meta_pattern_design",
                "community_leadership",
                "protocol_contribution",
            ],
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apprentice => write!(f, "apprentice"),
            Self::Journeyman => write!(f, "journeyman"),
            Self::Artisan => write!(f, "artisan"),
            Self::Master => write!(f, "master"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    SynthesisMaster,
    VelocityDemon,
    PatternHunter,
    MetaMaster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstEscape,
    PerfectTen,
    PatternCollector,
    Teacher,
    LightningEscape,
}

/// The six sub-scores of one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub recognition: i32,
    pub velocity: i32,
    pub elegance: i32,
    pub meta_awareness: i32,
    pub synthesis: i32,
    /// Negative for a repeated failure on a known pattern.
    pub immunity: i32,
}

impl ScoreBreakdown {
    /// Sum of the sub-scores before multipliers.
    pub fn base(&self) -> i32 {
        self.recognition
            + self.velocity
            + self.elegance
            + self.meta_awareness
            + self.synthesis
            + self.immunity
    }
}

/// Level change produced by a scoring call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advancement {
    pub advanced: bool,
    pub from: Level,
    pub to: Level,
    pub unlocked_affordances: Vec<String>,
}

/// Outcome of [`ResilienceEngine::score_escape`](super::ResilienceEngine::score_escape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub contributor_id: String,
    /// Composite resilience earned by this attempt.
    pub resilience: u64,
    pub breakdown: ScoreBreakdown,
    pub complexity_multiplier: f64,
    pub streak_bonus: f64,
    /// Profile total after this attempt.
    pub total_resilience: u64,
    pub level: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advancement: Option<Advancement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_achievements: Vec<Achievement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_specializations: Vec<Specialization>,
}
