//! Pattern Injector: rewrites a reasoning tree to carry false certainty.
//!
//! # Flow
//!
//! ```text
//! ReasoningNode ──inject──► boosted root certainty (cap 0.97, 3 decimals)
//!                            │
//!                            ├─ weak evidence suppressed, survivors ×1.2
//!                            ├─ certainty phrase + tautological closing
//!                            ├─ children cascaded ×1.3 (cap 0.95) to depth N
//!                            └─ `countertype` metadata at the root
//!
//! response + injected node ──detect_escape──► EscapeVerdict
//! ```
//!
//! Injection is infallible: absent fields take their documented defaults.

pub mod cascade;
pub mod detector;
pub mod hints;

pub use cascade::CertaintyCascadeInjector;
pub use detector::{detect_escape, EscapeMethod, EscapeSignals, EscapeVerdict};
pub use hints::provide_hints;

use serde::{Deserialize, Serialize};

/// Tuning for a single injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// How aggressively root certainty is pushed towards 1.0, in [0, 1].
    pub intensity: f64,
    /// Tree levels below the root that receive the cascading boost.
    pub cascade_depth: u32,
    /// Evidence with support below this is suppressed, in [0, 1].
    pub filter_threshold: f64,
    /// Seed for phrase selection and missing-support placeholders.
    /// `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            intensity: 0.8,
            cascade_depth: 3,
            filter_threshold: 0.3,
            seed: None,
        }
    }
}

impl InjectionConfig {
    /// Copy with every ratio forced into [0, 1]. NaN falls back to the default.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        Self {
            intensity: clamp_unit(self.intensity, defaults.intensity),
            cascade_depth: self.cascade_depth,
            filter_threshold: clamp_unit(self.filter_threshold, defaults.filter_threshold),
            seed: self.seed,
        }
    }
}

fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Round to three decimal places.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
