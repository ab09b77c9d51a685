//! Subcommand handlers. Each returns the JSON value printed on stdout.

use std::path::Path;

use anyhow::{bail, Context, Result};
use countertype::{
    detect_escape, provide_hints, CertaintyCascadeInjector, CountertypeConfig, EscapeAttempt,
    ProfileRecord, ProfileStore, ReasoningNode, ResilienceEngine,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;

use crate::{Command, SchemaKind};

pub fn run(command: Command, config: CountertypeConfig) -> Result<Value> {
    match command {
        Command::Inject {
            input,
            intensity,
            cascade_depth,
            filter_threshold,
            seed,
        } => {
            let mut injection = config.injection;
            if let Some(v) = intensity {
                injection.intensity = v;
            }
            if let Some(v) = cascade_depth {
                injection.cascade_depth = v;
            }
            if let Some(v) = filter_threshold {
                injection.filter_threshold = v;
            }
            if seed.is_some() {
                injection.seed = seed;
            }

            let node: ReasoningNode = read_json(&input)?;
            let injected = CertaintyCascadeInjector::new(injection).inject(&node);
            info!(
                nodes = injected.node_count(),
                certainty = injected.certainty,
                "Injected certainty cascade"
            );
            Ok(serde_json::to_value(injected)?)
        }
        Command::Detect { response, original } => {
            let response: Value = read_json(&response)?;
            let original: ReasoningNode = read_json(&original)?;
            Ok(serde_json::to_value(detect_escape(&response, &original))?)
        }
        Command::Hints => Ok(json!(provide_hints(&ReasoningNode::new("")))),
        Command::Score {
            store,
            contributor,
            attempt,
        } => {
            let attempt: EscapeAttempt = read_json(&attempt)?;
            let engine = open_engine(&store, &config)?;
            let result = engine.score_escape(&contributor, &attempt)?;
            engine.store().save(&store)?;
            Ok(serde_json::to_value(result)?)
        }
        Command::Leaderboard { store, limit } => {
            let engine = open_engine(&store, &config)?;
            Ok(serde_json::to_value(engine.leaderboard(limit)?)?)
        }
        Command::Export { store, contributor } => {
            let engine = open_engine(&store, &config)?;
            match engine.export_profile(&contributor)? {
                Some(record) => Ok(serde_json::to_value(record)?),
                None => bail!("No profile for contributor '{}'", contributor),
            }
        }
        Command::Import { store, record } => {
            let record: ProfileRecord = read_json(&record)?;
            let id = record.id.clone();
            let engine = open_engine(&store, &config)?;
            engine.import_profile(record)?;
            engine.store().save(&store)?;
            Ok(json!({ "imported": id }))
        }
        Command::Schema { record } => {
            let schema = match record {
                SchemaKind::Node => schemars::schema_for!(ReasoningNode),
                SchemaKind::Attempt => schemars::schema_for!(EscapeAttempt),
            };
            Ok(serde_json::to_value(schema)?)
        }
    }
}

fn open_engine(store: &Path, config: &CountertypeConfig) -> Result<ResilienceEngine> {
    let scoring = config.scoring.sanitized();
    let profiles = ProfileStore::load_with_limit(store, scoring.history_limit)
        .with_context(|| format!("Failed to open profile store {}", store.display()))?;
    Ok(ResilienceEngine::with_config(profiles.shared(), scoring))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
}
