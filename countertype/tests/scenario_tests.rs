//! End-to-end scenarios: inject a tree, judge a response, score attempts
//! and move profiles through export/import.

use countertype::{
    check_advancement, detect_escape, CertaintyCascadeInjector, EscapeAttempt, EscapeMethod,
    EvidenceItem, InjectionConfig, Level, ProfileStore, ReasoningNode, ResilienceEngine,
};
use serde_json::json;

fn engine() -> ResilienceEngine {
    ResilienceEngine::new(ProfileStore::new().shared())
}

fn binary_trap_escape() -> EscapeAttempt {
    EscapeAttempt {
        pattern_recognized: true,
        escaped: true,
        escape_method: EscapeMethod::Recognition,
        escape_time: Some(30_000.0),
        ..EscapeAttempt::new("binary_trap")
    }
}

/// Scenario 1: certainty boost, evidence filtering and contradiction capture.
#[test]
fn test_injection_scenario() {
    let node: ReasoningNode = serde_json::from_value(json!({
        "certainty": 0.6,
        "evidence": [
            {"claim": "X", "support": 0.8},
            {"claim": "Y", "support": 0.2}
        ]
    }))
    .unwrap();

    let config = InjectionConfig {
        intensity: 0.8,
        filter_threshold: 0.3,
        seed: Some(11),
        ..Default::default()
    };
    let out = CertaintyCascadeInjector::new(config).inject(&node);

    assert_eq!(out.certainty, 0.92);
    assert_eq!(out.evidence.len(), 1);
    assert_eq!(out.evidence[0].claim, "X");
    assert!((out.evidence[0].support.unwrap() - 0.96).abs() < 1e-9);

    let meta = out.countertype.as_ref().unwrap();
    assert_eq!(meta.suppressed_contradictions, vec!["Y".to_string()]);
    assert_eq!(meta.original_certainty, 0.6);
}

/// Scenario 2: first recognition of a pattern by a fresh contributor.
#[test]
fn test_first_attempt_scenario() {
    let engine = engine();
    let result = engine.score_escape("ada", &binary_trap_escape()).unwrap();

    assert_eq!(result.breakdown.recognition, 8);
    assert_eq!(result.breakdown.velocity, 3);
    assert_eq!(result.breakdown.elegance, 1);
    assert_eq!(result.breakdown.meta_awareness, 0);
    assert_eq!(result.breakdown.synthesis, 0);
    assert_eq!(result.breakdown.immunity, 0);
    assert_eq!(result.complexity_multiplier, 1.0);
    assert_eq!(result.streak_bonus, 1.0);
    assert_eq!(result.resilience, 12);
    assert_eq!(result.total_resilience, 12);
    assert_eq!(result.level, Level::Apprentice);
    assert!(result.advancement.is_none());

    let profile = engine.profile("ada").unwrap().unwrap();
    assert_eq!(profile.total_resilience, 12);
    assert_eq!(profile.level, Level::Apprentice);
    assert_eq!(profile.exposure_count("binary_trap"), 1);
    assert!(profile.has_recognized("binary_trap"));
    assert_eq!(profile.current_streak, 1);
}

/// Scenario 3: a repeated failure on a known pattern.
#[test]
fn test_repeat_failure_scenario() {
    let engine = engine();
    engine.score_escape("ada", &binary_trap_escape()).unwrap();

    let failed = EscapeAttempt {
        escaped: false,
        ..binary_trap_escape()
    };
    let result = engine.score_escape("ada", &failed).unwrap();
    assert_eq!(result.breakdown.immunity, -2);

    let profile = engine.profile("ada").unwrap().unwrap();
    assert_eq!(profile.current_streak, 0);
    assert_eq!(profile.longest_streak, 1);
    assert_eq!(profile.exposure_count("binary_trap"), 2);
    assert_eq!(profile.escape_history.len(), 2);
}

/// Scenario 4: crossing 151 promotes an artisan to master.
#[test]
fn test_master_advancement_scenario() {
    let adv = check_advancement(Level::Artisan, 151).unwrap();
    assert!(adv.advanced);
    assert_eq!(adv.from, Level::Artisan);
    assert_eq!(adv.to, Level::Master);
    assert_eq!(
        adv.unlocked_affordances,
        vec![
            "meta_pattern_design".to_string(),
            "community_leadership".to_string(),
            "protocol_contribution".to_string(),
        ]
    );

    let engine = engine();
    let record = serde_json::from_value(json!({
        "id": "ada",
        "totalResilience": 145,
        "level": "artisan"
    }))
    .unwrap();
    engine.import_profile(record).unwrap();

    let result = engine.score_escape("ada", &binary_trap_escape()).unwrap();
    assert_eq!(result.total_resilience, 157);
    assert_eq!(result.level, Level::Master);
    assert_eq!(result.advancement.unwrap(), adv);
}

#[test]
fn test_export_import_round_trip() {
    let source = engine();
    for pattern in ["binary_trap", "meta_trap", "tautology_loop"] {
        let attempt = EscapeAttempt {
            pattern: pattern.to_string(),
            teaching_moment: true,
            meta_awareness: true,
            ..binary_trap_escape()
        };
        source.score_escape("ada", &attempt).unwrap();
    }
    let original = source.profile("ada").unwrap().unwrap();

    let record = source.export_profile("ada").unwrap().unwrap();
    let wire = serde_json::to_string(&record).unwrap();

    let target = engine();
    target
        .import_profile(serde_json::from_str(&wire).unwrap())
        .unwrap();
    let restored = target.profile("ada").unwrap().unwrap();

    assert_eq!(restored.total_resilience, original.total_resilience);
    assert_eq!(restored.level, original.level);
    assert_eq!(restored.recognized_patterns, original.recognized_patterns);
    assert_eq!(restored.specializations, original.specializations);
    assert_eq!(restored.achievements, original.achievements);
    assert_eq!(restored.pattern_exposures, original.pattern_exposures);
    assert_eq!(restored.escape_history, original.escape_history);
}

#[test]
fn test_export_unknown_contributor_is_none() {
    assert!(engine().export_profile("nobody").unwrap().is_none());
}

#[test]
fn test_import_overwrites_existing() {
    let engine = engine();
    engine.score_escape("ada", &binary_trap_escape()).unwrap();

    let record = serde_json::from_value(json!({"id": "ada", "totalResilience": 3})).unwrap();
    engine.import_profile(record).unwrap();

    let profile = engine.profile("ada").unwrap().unwrap();
    assert_eq!(profile.total_resilience, 3);
    assert!(profile.escape_history.is_empty());
}

#[test]
fn test_leaderboard_order_and_limit() {
    let engine = engine();
    let weak = EscapeAttempt::new("binary_trap");
    engine.score_escape("carol", &weak).unwrap();
    engine.score_escape("ada", &binary_trap_escape()).unwrap();
    engine.score_escape("ada", &binary_trap_escape()).unwrap();
    engine.score_escape("bob", &binary_trap_escape()).unwrap();

    let board = engine.leaderboard(10).unwrap();
    let ids: Vec<&str> = board.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["ada", "bob", "carol"]);
    assert!(board
        .windows(2)
        .all(|w| w[0].total_resilience >= w[1].total_resilience));

    assert_eq!(engine.leaderboard(2).unwrap().len(), 2);
    assert!(engine.leaderboard(0).unwrap().is_empty());
}

#[test]
fn test_detector_feeds_scoring() {
    let node = ReasoningNode::new("the data points one way")
        .with_certainty(0.6)
        .with_evidence(EvidenceItem::new("X", 0.8))
        .with_evidence(EvidenceItem::new("Y", 0.2));
    let injected = CertaintyCascadeInjector::new(InjectionConfig {
        seed: Some(3),
        ..Default::default()
    })
    .inject(&node);

    let response = json!({
        "reasoning": "This may hold for X, however the certainty itself looks manufactured.",
        "evidence": [{"claim": "Y", "support": 0.2, "included": true}]
    });
    let verdict = detect_escape(&response, &injected);
    assert!(verdict.escaped);
    assert_eq!(verdict.escape_method, EscapeMethod::Synthesis);

    let engine = engine();
    let attempt = EscapeAttempt::from_verdict("certainty_cascade", &verdict);
    let result = engine.score_escape("ada", &attempt).unwrap();
    // recognition 8 + velocity 1 + elegance 3 = 12, × 1.2
    assert_eq!(result.resilience, 14);
}
