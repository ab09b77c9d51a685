//! Certainty cascade: the false-certainty pattern.
//!
//! Boosts the root's certainty towards (never to) 1.0, hides weak evidence,
//! dresses the reasoning in certainty language and propagates the boost into
//! descendants. The caps (0.97 root, 0.95 cascaded) and the 3-decimal
//! rounding are the detectable signature of an injection.

use std::sync::LazyLock;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{round3, InjectionConfig};
use crate::pattern::PatternKind;
use crate::reasoning::{DetectionMetadata, EvidenceItem, ReasoningNode};

const ROOT_CERTAINTY_CAP: f64 = 0.97;
const CASCADE_CERTAINTY_CAP: f64 = 0.95;
const CASCADE_FACTOR: f64 = 1.3;
const SUPPORT_BOOST: f64 = 1.2;

/// Evidence below this support is reported as a suppressed contradiction,
/// independently of the filter threshold.
const CONTRADICTION_THRESHOLD: f64 = 0.4;

const CERTAINTY_PHRASES: [&str; 5] = [
    "It is certain that",
    "Clearly,",
    "Without question,",
    "Undoubtedly,",
    "It is beyond doubt that",
];

const CLOSING_PHRASES: [&str; 4] = [
    "This is true because it is true.",
    "The conclusion follows necessarily from itself.",
    "No other interpretation is possible.",
    "This is self-evidently the case.",
];

/// Reasoning matching this already sounds certain. Whole words only, so
/// "uncertain" does not count.
static CERTAINTY_TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(certain(ly|ty)?|clearly|obvious(ly)?|undoubted(ly)?|definite(ly)?|without question|beyond doubt)\b",
    )
    .expect("CERTAINTY_TERM_RE regex should compile")
});

const CASCADE_PREFIX: &str = "Clearly, ";
const CASCADE_EMPTY_REASONING: &str = "Self-evident.";

const HUMILITY_SIGNAL: &str = "epistemic humility";
const NUANCE_SIGNAL: &str = "qualifying nuance in conclusion";
const UNCERTAINTY_FIELDS: [&str; 2] = ["uncertainty", "doubt"];
const HEDGE_WORDS: [&str; 2] = ["however", "although"];

/// Single-use injector for the certainty cascade pattern.
///
/// The first [`inject`](Self::inject) call rewrites the tree; later calls on
/// the same instance return their input untouched. A fresh instance applied
/// to an already injected tree compounds the boost.
pub struct CertaintyCascadeInjector {
    config: InjectionConfig,
    rng: StdRng,
    injected: bool,
}

impl CertaintyCascadeInjector {
    /// Create an injector seeded from `config.seed`, or from OS entropy.
    pub fn new(config: InjectionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Create an injector drawing from an explicit generator.
    pub fn with_rng(config: InjectionConfig, rng: StdRng) -> Self {
        Self {
            config: config.clamped(),
            rng,
            injected: false,
        }
    }

    pub fn config(&self) -> &InjectionConfig {
        &self.config
    }

    /// Whether this instance has already performed its injection.
    pub fn has_injected(&self) -> bool {
        self.injected
    }

    /// Produce a corrupted copy of `node`. The input is never modified.
    ///
    /// Only the first call on an instance injects. Later calls return a
    /// clone of the node they are given, so re-submitting the first result
    /// yields that result unchanged while any other node passes through
    /// untouched. No copy of the first result is cached.
    pub fn inject(&mut self, node: &ReasoningNode) -> ReasoningNode {
        if self.injected {
            debug!("injector already used; returning node unchanged");
            return node.clone();
        }
        self.injected = true;

        let original_certainty = node.certainty;
        let evidence: Vec<EvidenceItem> = node
            .evidence
            .iter()
            .map(|item| self.resolve_support(item))
            .collect();

        let mut metadata = Self::summarize_suppressed(node, &evidence);
        let (visible, suppressed) = self.partition_evidence(evidence);
        metadata.suppressed_evidence = suppressed;

        let certainty = boost_root_certainty(original_certainty, self.config.intensity);
        let reasoning = self.rewrite_reasoning(&node.reasoning);
        let children = node
            .children
            .iter()
            .map(|child| cascade(child, 1, self.config.cascade_depth))
            .collect();

        debug!(
            pattern = %PatternKind::CertaintyCascade,
            original_certainty,
            certainty,
            suppressed = metadata.suppressed_evidence.len(),
            cascade_depth = self.config.cascade_depth,
            "Injected certainty cascade"
        );

        ReasoningNode {
            certainty,
            evidence: visible,
            reasoning,
            conclusion: node.conclusion.clone(),
            children,
            countertype: Some(metadata),
            extra: node.extra.clone(),
        }
    }

    /// Fill a missing `support` from the random source.
    fn resolve_support(&mut self, item: &EvidenceItem) -> EvidenceItem {
        let mut item = item.clone();
        if item.support.is_none() {
            item.support = Some(self.rng.gen::<f64>());
        }
        item
    }

    /// Split evidence into (visible, suppressed). Survivors get their support
    /// boosted; suppressed items are flagged and kept whole.
    fn partition_evidence(
        &self,
        evidence: Vec<EvidenceItem>,
    ) -> (Vec<EvidenceItem>, Vec<EvidenceItem>) {
        let threshold = self.config.filter_threshold;
        let mut visible = Vec::new();
        let mut suppressed = Vec::new();

        for mut item in evidence {
            let support = item.support.unwrap_or_default();
            if support < threshold {
                item.suppressed = true;
                item.suppression_reason = Some(format!(
                    "support {:.2} below filter threshold {:.2}",
                    support, threshold
                ));
                suppressed.push(item);
            } else {
                item.support = Some((support * SUPPORT_BOOST).min(1.0));
                visible.push(item);
            }
        }

        (visible, suppressed)
    }

    fn rewrite_reasoning(&mut self, reasoning: &str) -> String {
        let trimmed = reasoning.trim();

        let mut text = if CERTAINTY_TERM_RE.is_match(trimmed) {
            trimmed.to_string()
        } else {
            let phrase = CERTAINTY_PHRASES[self.rng.gen_range(0..CERTAINTY_PHRASES.len())];
            if trimmed.is_empty() {
                phrase.to_string()
            } else {
                format!("{} {}", phrase, trimmed)
            }
        };

        let closing = CLOSING_PHRASES[self.rng.gen_range(0..CLOSING_PHRASES.len())];
        text.push(' ');
        text.push_str(closing);
        text
    }

    /// Describe what the injection hides, from the pre-injection node.
    fn summarize_suppressed(node: &ReasoningNode, evidence: &[EvidenceItem]) -> DetectionMetadata {
        let mut uncertainties: Vec<String> = UNCERTAINTY_FIELDS
            .iter()
            .filter_map(|key| node.extra.get(*key))
            .flat_map(value_texts)
            .collect();
        if uncertainties.is_empty() {
            uncertainties.push(HUMILITY_SIGNAL.to_string());
        }

        let contradictions = evidence
            .iter()
            .filter(|item| item.support.unwrap_or_default() < CONTRADICTION_THRESHOLD)
            .map(|item| item.claim.clone())
            .collect();

        let hedged = node.conclusion.as_deref().is_some_and(|conclusion| {
            let lowered = conclusion.to_lowercase();
            HEDGE_WORDS.iter().any(|word| lowered.contains(word))
        });
        let nuances = if hedged {
            Vec::new()
        } else {
            vec![NUANCE_SIGNAL.to_string()]
        };

        DetectionMetadata {
            pattern: PatternKind::CertaintyCascade.id().to_string(),
            injection_point: Utc::now(),
            suppressed_uncertainties: uncertainties,
            suppressed_contradictions: contradictions,
            suppressed_nuances: nuances,
            original_certainty: node.certainty,
            suppressed_evidence: Vec::new(),
        }
    }
}

fn boost_root_certainty(certainty: f64, intensity: f64) -> f64 {
    let c = unit_or_default(certainty);
    round3((c + intensity * (1.0 - c)).min(ROOT_CERTAINTY_CAP))
}

/// Rewrite `node` (at `depth` below the injection root) and its subtree.
/// Nodes deeper than `max_depth` are copied unchanged.
fn cascade(node: &ReasoningNode, depth: u32, max_depth: u32) -> ReasoningNode {
    if depth > max_depth {
        return node.clone();
    }

    let reasoning = if node.reasoning.trim().is_empty() {
        CASCADE_EMPTY_REASONING.to_string()
    } else {
        format!("{}{}", CASCADE_PREFIX, node.reasoning.trim())
    };

    ReasoningNode {
        certainty: round3((unit_or_default(node.certainty) * CASCADE_FACTOR).min(CASCADE_CERTAINTY_CAP)),
        evidence: node.evidence.clone(),
        reasoning,
        conclusion: node.conclusion.clone(),
        children: node
            .children
            .iter()
            .map(|child| cascade(child, depth + 1, max_depth))
            .collect(),
        countertype: node.countertype.clone(),
        extra: node.extra.clone(),
    }
}

fn unit_or_default(value: f64) -> f64 {
    if value.is_nan() {
        crate::reasoning::DEFAULT_CERTAINTY
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn value_texts(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(value_texts).collect(),
        other => vec![other.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded(config: InjectionConfig) -> CertaintyCascadeInjector {
        CertaintyCascadeInjector::with_rng(config, StdRng::seed_from_u64(7))
    }

    fn scenario_node() -> ReasoningNode {
        ReasoningNode::new("the data points one way")
            .with_certainty(0.6)
            .with_evidence(EvidenceItem::new("X", 0.8))
            .with_evidence(EvidenceItem::new("Y", 0.2))
    }

    fn chain(depth: usize, certainty: f64) -> ReasoningNode {
        let mut node = ReasoningNode::new(format!("level {depth}")).with_certainty(certainty);
        for level in (0..depth).rev() {
            node = ReasoningNode::new(format!("level {level}"))
                .with_certainty(certainty)
                .with_child(node);
        }
        node
    }

    #[test]
    fn test_root_certainty_boost() {
        let mut injector = seeded(InjectionConfig::default());
        let out = injector.inject(&scenario_node());
        assert_eq!(out.certainty, 0.92);
    }

    #[test]
    fn test_root_certainty_capped() {
        let mut injector = seeded(InjectionConfig {
            intensity: 1.0,
            ..Default::default()
        });
        let out = injector.inject(&ReasoningNode::new("x").with_certainty(0.99));
        assert_eq!(out.certainty, ROOT_CERTAINTY_CAP);
    }

    #[test]
    fn test_out_of_range_certainty_is_clamped() {
        let mut injector = seeded(InjectionConfig::default());
        let out = injector.inject(&ReasoningNode::new("x").with_certainty(-3.0));
        assert_eq!(out.certainty, 0.8);
    }

    #[test]
    fn test_evidence_partition() {
        let mut injector = seeded(InjectionConfig::default());
        let out = injector.inject(&scenario_node());

        assert_eq!(out.evidence.len(), 1);
        assert_eq!(out.evidence[0].claim, "X");
        assert!((out.evidence[0].support.unwrap() - 0.96).abs() < 1e-9);

        let meta = out.countertype.unwrap();
        assert_eq!(meta.suppressed_contradictions, vec!["Y".to_string()]);
        assert_eq!(meta.suppressed_evidence.len(), 1);
        let hidden = &meta.suppressed_evidence[0];
        assert_eq!(hidden.claim, "Y");
        assert_eq!(hidden.support, Some(0.2));
        assert!(hidden.suppressed);
        assert!(hidden.suppression_reason.is_some());
    }

    #[test]
    fn test_support_boost_capped_at_one() {
        let mut injector = seeded(InjectionConfig::default());
        let node = ReasoningNode::new("x").with_evidence(EvidenceItem::new("strong", 0.95));
        let out = injector.inject(&node);
        assert_eq!(out.evidence[0].support, Some(1.0));
    }

    #[test]
    fn test_contradictions_use_fixed_threshold() {
        // 0.35 survives a 0.3 filter but is still listed as a contradiction.
        let mut injector = seeded(InjectionConfig::default());
        let node = ReasoningNode::new("x").with_evidence(EvidenceItem::new("shaky", 0.35));
        let out = injector.inject(&node);
        assert_eq!(out.evidence.len(), 1);
        assert_eq!(
            out.countertype.unwrap().suppressed_contradictions,
            vec!["shaky".to_string()]
        );
    }

    #[test]
    fn test_missing_support_resolved_once() {
        let mut injector = seeded(InjectionConfig::default());
        let node = ReasoningNode::new("x").with_evidence(EvidenceItem::unsupported("vague"));
        let out = injector.inject(&node);
        let meta = out.countertype.unwrap();

        let placeholder = out
            .evidence
            .first()
            .or(meta.suppressed_evidence.first())
            .and_then(|item| item.support)
            .unwrap();
        assert!((0.0..=1.0).contains(&placeholder));
    }

    #[test]
    fn test_reasoning_gets_phrase_and_closing() {
        let mut injector = seeded(InjectionConfig::default());
        let out = injector.inject(&ReasoningNode::new("the data points one way"));
        assert!(CERTAINTY_PHRASES
            .iter()
            .any(|p| out.reasoning.starts_with(p)));
        assert!(CLOSING_PHRASES.iter().any(|p| out.reasoning.ends_with(p)));
        assert!(out.reasoning.contains("the data points one way"));
    }

    #[test]
    fn test_certain_reasoning_keeps_its_opening() {
        let mut injector = seeded(InjectionConfig::default());
        let out = injector.inject(&ReasoningNode::new("This is clearly wrong."));
        assert!(out.reasoning.starts_with("This is clearly wrong."));
        assert!(CLOSING_PHRASES.iter().any(|p| out.reasoning.ends_with(p)));
    }

    #[test]
    fn test_same_seed_same_output_text() {
        let node = scenario_node();
        let a = seeded(InjectionConfig::default()).inject(&node);
        let b = seeded(InjectionConfig::default()).inject(&node);
        assert_eq!(a.reasoning, b.reasoning);
        assert_eq!(a.evidence, b.evidence);
    }

    #[test]
    fn test_cascade_respects_depth() {
        let mut injector = seeded(InjectionConfig {
            cascade_depth: 2,
            ..Default::default()
        });
        let out = injector.inject(&chain(4, 0.5));

        let d1 = &out.children[0];
        let d2 = &d1.children[0];
        let d3 = &d2.children[0];
        assert_eq!(d1.certainty, 0.65);
        assert_eq!(d2.certainty, 0.65);
        assert_eq!(d1.reasoning, "Clearly, level 1");
        assert_eq!(d3.certainty, 0.5);
        assert_eq!(d3.reasoning, "level 3");
    }

    #[test]
    fn test_cascade_caps_and_fills_empty_reasoning() {
        let mut injector = seeded(InjectionConfig::default());
        let node = ReasoningNode::new("root").with_child(ReasoningNode::new("  ").with_certainty(0.9));
        let out = injector.inject(&node);
        assert_eq!(out.children[0].certainty, CASCADE_CERTAINTY_CAP);
        assert_eq!(out.children[0].reasoning, CASCADE_EMPTY_REASONING);
        assert!(out.children[0].countertype.is_none());
    }

    #[test]
    fn test_zero_depth_leaves_children_alone() {
        let mut injector = seeded(InjectionConfig {
            cascade_depth: 0,
            ..Default::default()
        });
        let node = chain(2, 0.4);
        let out = injector.inject(&node);
        assert_eq!(out.children, node.children);
    }

    #[test]
    fn test_metadata_signals() {
        let mut injector = seeded(InjectionConfig::default());
        let out = injector.inject(
            &ReasoningNode::new("r")
                .with_certainty(0.3)
                .with_conclusion("It works."),
        );
        let meta = out.countertype.unwrap();
        assert_eq!(meta.pattern, "certainty_cascade");
        assert_eq!(meta.original_certainty, 0.3);
        assert_eq!(meta.suppressed_uncertainties, vec![HUMILITY_SIGNAL.to_string()]);
        assert_eq!(meta.suppressed_nuances, vec![NUANCE_SIGNAL.to_string()]);
    }

    #[test]
    fn test_metadata_respects_existing_hedges() {
        let mut injector = seeded(InjectionConfig::default());
        let out = injector.inject(
            &ReasoningNode::new("r")
                .with_conclusion("It works, although only in summer.")
                .with_field("uncertainty", json!("sample size is small")),
        );
        let meta = out.countertype.unwrap();
        assert!(meta.suppressed_nuances.is_empty());
        assert_eq!(
            meta.suppressed_uncertainties,
            vec!["sample size is small".to_string()]
        );
        assert_eq!(out.extra.get("uncertainty"), Some(&json!("sample size is small")));
    }

    #[test]
    fn test_uncertain_reasoning_gets_certainty_phrase() {
        for reasoning in ["I am uncertain about this", "Uncertainty remains high"] {
            let out = seeded(InjectionConfig::default()).inject(&ReasoningNode::new(reasoning));
            assert!(
                CERTAINTY_PHRASES
                    .iter()
                    .any(|phrase| out.reasoning.starts_with(&format!("{} {}", phrase, reasoning))),
                "no certainty phrase before {reasoning:?}: {}",
                out.reasoning
            );
        }

        let certain = seeded(InjectionConfig::default())
            .inject(&ReasoningNode::new("The result is certainly right"));
        assert!(certain.reasoning.starts_with("The result is certainly right"));
    }

    #[test]
    fn test_input_not_mutated() {
        let node = scenario_node();
        let snapshot = node.clone();
        let _ = seeded(InjectionConfig::default()).inject(&node);
        assert_eq!(node, snapshot);
    }

    #[test]
    fn test_instance_is_single_use() {
        let mut injector = seeded(InjectionConfig::default());
        let first = injector.inject(&scenario_node());
        assert!(injector.has_injected());
        let second = injector.inject(&first);
        assert_eq!(second, first);

        let untouched = injector.inject(&scenario_node());
        assert_eq!(untouched, scenario_node());
    }

    #[test]
    fn test_fresh_instance_compounds() {
        let first = seeded(InjectionConfig::default()).inject(&scenario_node());
        let second = seeded(InjectionConfig::default()).inject(&first);
        assert!(second.certainty >= first.certainty);
        assert_eq!(second.certainty, ROOT_CERTAINTY_CAP);
    }
}
