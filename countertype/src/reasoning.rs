//! Reasoning tree model: the structure the pattern injector rewrites.
//!
//! Every record keeps unknown caller-supplied fields in a flattened `extra`
//! map so they survive injection verbatim. Field names on the wire match the
//! JSON documents produced and consumed by the surrounding tooling
//! (`certainty`, `_suppressed`, `countertype`, ...).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Certainty assumed for a node that does not state one.
pub const DEFAULT_CERTAINTY: f64 = 0.5;

fn default_certainty() -> f64 {
    DEFAULT_CERTAINTY
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A node in a reasoning tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReasoningNode {
    /// Confidence in this node's conclusion, in [0, 1].
    #[serde(default = "default_certainty")]
    pub certainty: f64,
    /// Supporting (or undermining) evidence, in presentation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceItem>,
    /// Free-text reasoning.
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ReasoningNode>,
    /// Provenance attached by an injection. Only ever present on the root
    /// of an injected tree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countertype: Option<DetectionMetadata>,
    /// Caller-supplied fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReasoningNode {
    /// Create a node with the given reasoning text and default certainty.
    pub fn new(reasoning: impl Into<String>) -> Self {
        Self {
            certainty: DEFAULT_CERTAINTY,
            evidence: Vec::new(),
            reasoning: reasoning.into(),
            conclusion: None,
            children: Vec::new(),
            countertype: None,
            extra: Map::new(),
        }
    }

    pub fn with_certainty(mut self, certainty: f64) -> Self {
        self.certainty = certainty;
        self
    }

    pub fn with_evidence(mut self, item: EvidenceItem) -> Self {
        self.evidence.push(item);
        self
    }

    pub fn with_conclusion(mut self, conclusion: impl Into<String>) -> Self {
        self.conclusion = Some(conclusion.into());
        self
    }

    pub fn with_child(mut self, child: ReasoningNode) -> Self {
        self.children.push(child);
        self
    }

    /// Set an opaque caller field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether this node is the root of an injection.
    pub fn is_injected(&self) -> bool {
        self.countertype.is_some()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ReasoningNode::node_count)
            .sum::<usize>()
    }
}

/// A single piece of evidence attached to a reasoning node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceItem {
    #[serde(default)]
    pub claim: String,
    /// Strength of support in [0, 1]. Missing values are filled in by the
    /// injector from its random source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<f64>,
    #[serde(rename = "_suppressed", default, skip_serializing_if = "is_false")]
    pub suppressed: bool,
    #[serde(
        rename = "_suppressionReason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub suppression_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EvidenceItem {
    pub fn new(claim: impl Into<String>, support: f64) -> Self {
        Self {
            claim: claim.into(),
            support: Some(support),
            suppressed: false,
            suppression_reason: None,
            extra: Map::new(),
        }
    }

    /// Evidence with no stated support.
    pub fn unsupported(claim: impl Into<String>) -> Self {
        Self {
            support: None,
            ..Self::new(claim, 0.0)
        }
    }
}

/// Detection metadata recorded at the root of an injected tree.
///
/// Append-only provenance: nothing re-derives the node from it. Serialized
/// under the `countertype` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectionMetadata {
    /// Identifier of the injected pattern.
    pub pattern: String,
    pub injection_point: DateTime<Utc>,
    #[serde(default)]
    pub suppressed_uncertainties: Vec<String>,
    #[serde(default)]
    pub suppressed_contradictions: Vec<String>,
    #[serde(default)]
    pub suppressed_nuances: Vec<String>,
    /// Root certainty before injection.
    pub original_certainty: f64,
    /// Evidence removed from the visible list, kept verbatim.
    #[serde(default)]
    pub suppressed_evidence: Vec<EvidenceItem>,
}
