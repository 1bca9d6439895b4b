use deckwright_core::{
    generate_action_hand, generate_targets_hand, ActionDef, ActionRecMode, ActiveMilestoneSignals,
    BasisTag, Collectible, CollectibleType, GameStateForRecs, MilestoneField, PlayerStats,
    ProgressSignal, Recommender, RecsConfig, RunProgress, RunProgressLabel, RunRecord, School,
    FS_REQUIRES_FA_NOTICE, NO_ABSTRACTION_NOTICE,
};

const NOW: u64 = 1_234_567_890;

fn catalog() -> Vec<ActionDef> {
    vec![
        ActionDef::new("FP-01", "North Star", School::Planning),
        ActionDef::new("FP-02", "Scope Fence", School::Planning),
        ActionDef::new("FP-08", "Tripwires", School::Planning),
        ActionDef::new("FP-10", "Done Receipt", School::Planning),
        ActionDef::new("FI-01", "Introduce Feature", School::Introduction),
        ActionDef::new("FU-03", "Understand Current Flow", School::Understanding),
        ActionDef::new("FPR-02", "Present Current Behavior", School::Presentation),
        ActionDef::new("FA-02", "Abstract Interfaces", School::Abstraction),
        ActionDef::new("FS-01", "Synthesize Plan", School::Synthesis),
    ]
}

fn item(id: &str, kind: CollectibleType, run: &str, school: School) -> Collectible {
    Collectible::new(id, kind, run, Some(school))
}

fn run(id: &str, action_id: &str, school: School, collectibles: Vec<Collectible>) -> RunRecord {
    RunRecord {
        run_id: id.to_string(),
        action_id: action_id.to_string(),
        school,
        milestone_id: Some("m1".to_string()),
        collectibles,
        progress_facet: None,
        created_at_ms: None,
    }
}

fn milestone(confidence: &[(MilestoneField, f64)]) -> ActiveMilestoneSignals {
    ActiveMilestoneSignals {
        id: "m1".to_string(),
        field_confidence: Some(confidence.iter().copied().collect()),
        ..ActiveMilestoneSignals::default()
    }
}

fn enriched() -> ActiveMilestoneSignals {
    milestone(&[
        (MilestoneField::NorthStar, 0.9),
        (MilestoneField::DoneReceipt, 0.8),
        (MilestoneField::ScopeFence, 0.75),
        (MilestoneField::Tripwires, 0.7),
    ])
}

fn fixture_state() -> GameStateForRecs {
    let mut r2 = run(
        "r2",
        "FI-01",
        School::Introduction,
        vec![
            item("k2", CollectibleType::Decision, "r2", School::Introduction),
            item("a1", CollectibleType::Anchor, "r2", School::Introduction),
        ],
    );
    r2.progress_facet = Some(ProgressSignal::PerRun(RunProgress {
        progress_label: RunProgressLabel::Partial,
        progress_score: 0.55,
        in_scope: true,
        next_best_move_hint: "[FU] clarify the moving parts".to_string(),
    }));
    GameStateForRecs {
        active_milestone: Some(milestone(&[
            (MilestoneField::NorthStar, 0.9),
            (MilestoneField::ScopeFence, 0.5),
            (MilestoneField::Tripwires, 0.4),
            (MilestoneField::DoneReceipt, 0.6),
        ])),
        completed_milestones: vec!["m0".to_string()],
        runs: vec![
            run(
                "r1",
                "FP-01",
                School::Planning,
                vec![item("k1", CollectibleType::MilestoneNorthStar, "r1", School::Planning)],
            ),
            r2,
            run(
                "r3",
                "FA-02",
                School::Abstraction,
                vec![
                    item("k3", CollectibleType::Spec, "r3", School::Abstraction),
                    item("k4", CollectibleType::Plan, "r3", School::Abstraction),
                ],
            ),
        ],
        player_stats: Some(PlayerStats {
            school_pick_counts: [
                (School::Introduction, 3),
                (School::Understanding, 4),
                (School::Abstraction, 2),
            ]
            .into_iter()
            .collect(),
            recently_picked_actions: vec!["FI-01".to_string(), "FU-03".to_string()],
        }),
        unavailable_action_ids: Default::default(),
    }
}

fn ids<T>(items: &[deckwright_core::HandItem<T>], id: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|entry| id(&entry.item).to_string()).collect()
}

fn action_ids(items: &[deckwright_core::HandItem<ActionDef>]) -> Vec<String> {
    ids(items, |action| action.id.as_str())
}

#[test]
fn empty_history_starts_a_milestone() {
    let hand = generate_action_hand(&GameStateForRecs::default(), &catalog(), NOW);
    assert_eq!(hand.mode, ActionRecMode::FpStart);
    assert_eq!(action_ids(&hand.actions), vec!["FP-01", "FP-02", "FP-08", "FP-10"]);
    for entry in &hand.actions {
        assert_eq!(entry.basis_tag, BasisTag::MilestoneLinked);
        assert_eq!(entry.basis_note, "Milestone creation flow.");
        assert_eq!(entry.score, 10.0);
    }
    assert!(hand.hard_constraints.is_empty());
    assert_eq!(hand.snapshot_id, "AHS:kf12oi");
    assert_eq!(hand.generated_at_ms, NOW);
}

#[test]
fn milestone_start_backfills_missing_definition_steps() {
    let mut actions: Vec<ActionDef> = catalog()
        .into_iter()
        .filter(|action| action.id != "FP-08")
        .collect();
    actions.push(ActionDef::new("FP-03", "Constraints", School::Planning));
    let hand = generate_action_hand(&GameStateForRecs::default(), &actions, NOW);
    assert_eq!(action_ids(&hand.actions), vec!["FP-01", "FP-02", "FP-10", "FP-03"]);
    let fallback = &hand.actions[3];
    assert_eq!(fallback.basis_tag, BasisTag::Variety);
    assert_eq!(fallback.basis_note, "Fallback candidate.");
    assert_eq!(fallback.score, 1.0);
}

#[test]
fn milestone_start_skips_unavailable_actions() {
    let mut state = GameStateForRecs::default();
    state.unavailable_action_ids.insert("FP-02".to_string());
    let hand = generate_action_hand(&state, &catalog(), NOW);
    assert_eq!(action_ids(&hand.actions), vec!["FP-01", "FP-08", "FP-10"]);
}

#[test]
fn enriched_milestone_switches_to_chase() {
    let state = GameStateForRecs {
        active_milestone: Some(enriched()),
        runs: vec![
            run(
                "r1",
                "FI-01",
                School::Introduction,
                vec![item("k1", CollectibleType::Decision, "r1", School::Introduction)],
            ),
            run(
                "r2",
                "FA-02",
                School::Abstraction,
                vec![item("k2", CollectibleType::Spec, "r2", School::Abstraction)],
            ),
        ],
        ..GameStateForRecs::default()
    };
    let hand = generate_action_hand(&state, &catalog(), NOW);
    assert_eq!(hand.mode, ActionRecMode::Chase);
    assert_eq!(hand.actions.len(), 5);
    assert!(hand
        .actions
        .iter()
        .all(|entry| entry.item.school != School::Planning));
    let synthesis = hand
        .actions
        .iter()
        .filter(|entry| entry.item.school == School::Synthesis)
        .count();
    assert_eq!(synthesis, 1);
    assert_eq!(hand.hard_constraints, vec![FS_REQUIRES_FA_NOTICE.to_string()]);
}

#[test]
fn chase_without_abstraction_drops_synthesis() {
    let state = GameStateForRecs {
        active_milestone: Some(enriched()),
        runs: vec![run(
            "r1",
            "FI-01",
            School::Introduction,
            vec![item("k1", CollectibleType::Decision, "r1", School::Introduction)],
        )],
        ..GameStateForRecs::default()
    };
    let hand = generate_action_hand(&state, &catalog(), NOW);
    assert_eq!(hand.mode, ActionRecMode::Chase);
    assert_eq!(hand.actions.len(), 4);
    assert!(hand
        .actions
        .iter()
        .all(|entry| entry.item.school != School::Synthesis));
    assert!(hand.hard_constraints.is_empty());
}

#[test]
fn synthesis_hint_without_abstraction_gets_a_substitute() {
    let mut actions: Vec<ActionDef> = catalog()
        .into_iter()
        .filter(|action| action.school != School::Planning)
        .collect();
    actions.extend([
        ActionDef::new("FA-03", "Extract Boundaries", School::Abstraction),
        ActionDef::new("FA-04", "Name the Seams", School::Abstraction),
        ActionDef::new("FU-04", "Trace Data Flow", School::Understanding),
        ActionDef::new("FU-05", "Map Dependencies", School::Understanding),
    ]);
    let mut last = run(
        "r1",
        "FI-01",
        School::Introduction,
        vec![item("k1", CollectibleType::Decision, "r1", School::Introduction)],
    );
    last.progress_facet = Some(ProgressSignal::PerRun(RunProgress {
        progress_label: RunProgressLabel::Advanced,
        progress_score: 0.9,
        in_scope: true,
        next_best_move_hint: "[FS] pull it together".to_string(),
    }));
    let state = GameStateForRecs {
        active_milestone: Some(enriched()),
        runs: vec![last],
        ..GameStateForRecs::default()
    };

    let hand = generate_action_hand(&state, &actions, NOW);
    assert!(hand
        .actions
        .iter()
        .all(|entry| entry.item.school != School::Synthesis));
    let substitute = &hand.actions[0];
    assert_eq!(substitute.basis_note, "Avoided FS (no abstractions yet).");
    assert_eq!(substitute.basis_tag, BasisTag::Stability);
    assert!(matches!(
        substitute.item.school,
        School::Abstraction | School::Understanding
    ));
    assert_eq!(substitute.score, 9.5);
}

#[test]
fn missing_field_puts_its_action_first() {
    let state = GameStateForRecs {
        active_milestone: Some(milestone(&[
            (MilestoneField::NorthStar, 0.9),
            (MilestoneField::DoneReceipt, 0.9),
            (MilestoneField::ScopeFence, 0.9),
            (MilestoneField::Tripwires, 0.4),
        ])),
        runs: vec![run("r1", "FI-01", School::Introduction, Vec::new())],
        ..GameStateForRecs::default()
    };
    let hand = generate_action_hand(&state, &catalog(), NOW);
    assert_eq!(hand.mode, ActionRecMode::Enrich);
    assert!((4..=5).contains(&hand.actions.len()));
    let first = &hand.actions[0];
    assert_eq!(first.item.id, "FP-08");
    assert_eq!(first.basis_tag, BasisTag::MilestoneLinked);
    assert_eq!(first.score, 12.0);
}

#[test]
fn explicit_missing_list_overrides_confidence() {
    let mut signals = enriched();
    signals.missing_fields = Some(vec![MilestoneField::DoneReceipt, MilestoneField::NorthStar]);
    let state = GameStateForRecs {
        active_milestone: Some(signals),
        runs: vec![run("r1", "FU-03", School::Understanding, Vec::new())],
        ..GameStateForRecs::default()
    };
    let hand = generate_action_hand(&state, &catalog(), NOW);
    assert_eq!(hand.mode, ActionRecMode::Enrich);
    assert_eq!(action_ids(&hand.actions[..2]), vec!["FP-01", "FP-10"]);
}

#[test]
fn fixture_hand_leads_with_enrichment() {
    let hand = generate_action_hand(&fixture_state(), &catalog(), NOW);
    assert_eq!(hand.mode, ActionRecMode::Enrich);
    assert_eq!(hand.actions.len(), 5);
    assert_eq!(action_ids(&hand.actions[..2]), vec!["FP-02", "FP-08"]);
    for entry in &hand.actions {
        assert!(!entry.basis_note.is_empty());
    }
}

#[test]
fn synthesis_targets_include_an_abstraction_keystone() {
    let fs = ActionDef::new("FS-01", "Synthesize Plan", School::Synthesis);
    let hand = generate_targets_hand(&fixture_state(), &fs, &["k1".to_string()], NOW);
    assert_eq!(hand.targets.len(), 5);
    assert!(hand.targets.iter().any(|entry| {
        entry.item.produced_by_school == Some(School::Abstraction) && entry.item.kind.is_keystone()
    }));
    assert_eq!(hand.hard_constraints, vec![FS_REQUIRES_FA_NOTICE.to_string()]);
    assert_eq!(hand.snapshot_id, "THS:kf12oi");
}

#[test]
fn synthesis_targets_fail_closed_without_abstraction() {
    let mut state = fixture_state();
    state.runs.pop();
    let fs = ActionDef::new("FS-01", "Synthesize Plan", School::Synthesis);
    let hand = generate_targets_hand(&state, &fs, &[], NOW);
    assert!(hand.targets.is_empty());
    assert_eq!(
        hand.hard_constraints,
        vec![FS_REQUIRES_FA_NOTICE.to_string(), NO_ABSTRACTION_NOTICE.to_string()]
    );
}

#[test]
fn planning_targets_rank_the_milestone_link_first() {
    let fp = ActionDef::new("FP-02", "Scope Fence", School::Planning);
    let hand = generate_targets_hand(&fixture_state(), &fp, &["k1".to_string()], NOW);
    assert_eq!(
        ids(&hand.targets, |item| item.id.as_str()),
        vec!["k1", "k3", "k4", "k2", "a1"]
    );
    assert_eq!(hand.targets[0].basis_tag, BasisTag::MilestoneLinked);
    assert_eq!(hand.targets[1].basis_tag, BasisTag::RecentOutput);
    assert!(hand.hard_constraints.is_empty());
}

#[test]
fn thin_catalog_returns_every_eligible_action() {
    let actions = vec![
        ActionDef::new("FI-01", "Introduce Feature", School::Introduction),
        ActionDef::new("FU-03", "Understand Current Flow", School::Understanding),
        ActionDef::new("FA-02", "Abstract Interfaces", School::Abstraction),
    ];
    let state = GameStateForRecs {
        active_milestone: Some(enriched()),
        runs: vec![run("r1", "FI-01", School::Introduction, Vec::new())],
        ..GameStateForRecs::default()
    };
    let hand = generate_action_hand(&state, &actions, NOW);
    assert_eq!(hand.actions.len(), 3);
    let mut got = action_ids(&hand.actions);
    got.sort();
    assert_eq!(got, vec!["FA-02", "FI-01", "FU-03"]);
}

#[test]
fn identical_inputs_serialize_identically() {
    let state = fixture_state();
    let first = generate_action_hand(&state, &catalog(), NOW);
    let second = generate_action_hand(&state, &catalog(), NOW);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );

    let picked = &first.actions[0].item;
    let targets = generate_targets_hand(&state, picked, &["k1".to_string()], NOW);
    let again = generate_targets_hand(&state, picked, &["k1".to_string()], NOW);
    assert_eq!(
        serde_json::to_string(&targets).expect("serialize"),
        serde_json::to_string(&again).expect("serialize")
    );
}

fn progress(label: RunProgressLabel, hint: &str) -> Option<ProgressSignal> {
    Some(ProgressSignal::PerRun(RunProgress {
        progress_label: label,
        progress_score: 0.3,
        in_scope: true,
        next_best_move_hint: hint.to_string(),
    }))
}

#[test]
fn chase_keeps_only_the_strongest_synthesis() {
    let actions = vec![
        ActionDef::new("FI-01", "Introduce Feature", School::Introduction),
        ActionDef::new("FU-03", "Understand Current Flow", School::Understanding),
        ActionDef::new("FS-01", "Synthesize Plan", School::Synthesis),
        ActionDef::new("FS-02", "Synthesize Rollout", School::Synthesis),
    ];
    let mut latest = run("r2", "FPR-02", School::Presentation, Vec::new());
    latest.progress_facet = progress(RunProgressLabel::Advanced, "[FS] pull it together");
    let state = GameStateForRecs {
        active_milestone: Some(enriched()),
        runs: vec![run("r1", "FA-02", School::Abstraction, Vec::new()), latest],
        ..GameStateForRecs::default()
    };

    let hand = generate_action_hand(&state, &actions, NOW);
    assert_eq!(hand.mode, ActionRecMode::Chase);
    let synthesis: Vec<_> = hand
        .actions
        .iter()
        .filter(|entry| entry.item.school == School::Synthesis)
        .collect();
    assert_eq!(synthesis.len(), 1);
    assert_eq!(synthesis[0].basis_tag, BasisTag::ProgressProxy);
    assert_eq!(synthesis[0].score, 4.25);
    assert_eq!(hand.actions.len(), 3);
    assert_eq!(hand.hard_constraints, vec![FS_REQUIRES_FA_NOTICE.to_string()]);
}

#[test]
fn single_school_chase_gains_a_variety_pick() {
    let actions = vec![
        ActionDef::new("FI-01", "Introduce Feature", School::Introduction),
        ActionDef::new("FI-02", "Introduce Flag", School::Introduction),
        ActionDef::new("FI-03", "Introduce Loader", School::Introduction),
        ActionDef::new("FPR-02", "Present Current Behavior", School::Presentation),
        ActionDef::new("FS-01", "Synthesize Plan", School::Synthesis),
    ];
    let state = GameStateForRecs {
        active_milestone: Some(enriched()),
        runs: vec![
            run("r1", "FPR-02", School::Presentation, Vec::new()),
            run("r2", "FP-01", School::Planning, Vec::new()),
        ],
        ..GameStateForRecs::default()
    };
    let config = RecsConfig {
        action_hand_size: 4,
        ..RecsConfig::default()
    };

    let hand = Recommender::new(config).action_hand(&state, &actions, NOW);
    assert_eq!(hand.mode, ActionRecMode::Chase);
    assert_eq!(hand.actions.len(), 4);
    let first = &hand.actions[0];
    assert_eq!(first.item.id, "FPR-02");
    assert_eq!(first.basis_tag, BasisTag::Variety);
    assert_eq!(first.basis_note, "Added variety for momentum.");
    assert_eq!(first.score, 7.0);
    assert!(hand.actions[1..]
        .iter()
        .all(|entry| entry.item.school == School::Introduction));
    assert!(hand.hard_constraints.is_empty());
}

fn stability_state(label: RunProgressLabel) -> GameStateForRecs {
    let mut latest = run("r1", "FI-01", School::Introduction, Vec::new());
    latest.progress_facet = progress(label, "");
    GameStateForRecs {
        active_milestone: Some(enriched()),
        runs: vec![latest],
        ..GameStateForRecs::default()
    }
}

fn stability_catalog() -> Vec<ActionDef> {
    vec![
        ActionDef::new("FU-03", "Understand Current Flow", School::Understanding),
        ActionDef::new("FU-04", "Understand Data Model", School::Understanding),
        ActionDef::new("FU-05", "Understand Failure Modes", School::Understanding),
        ActionDef::new("FA-02", "Abstract Interfaces", School::Abstraction),
        ActionDef::new("FPR-02", "Present Current Behavior", School::Presentation),
    ]
}

#[test]
fn stability_slot_prefers_abstraction_when_steady() {
    let hand = generate_action_hand(
        &stability_state(RunProgressLabel::Advanced),
        &stability_catalog(),
        NOW,
    );
    let stability = hand
        .actions
        .iter()
        .find(|entry| entry.basis_tag == BasisTag::Stability)
        .expect("stability pick");
    assert_eq!(stability.item.id, "FA-02");
}

#[test]
fn stability_slot_consolidates_after_drift_or_stall() {
    for label in [RunProgressLabel::Drift, RunProgressLabel::Stalled] {
        let hand = generate_action_hand(&stability_state(label), &stability_catalog(), NOW);
        let stability = hand
            .actions
            .iter()
            .find(|entry| entry.basis_tag == BasisTag::Stability)
            .expect("stability pick");
        assert_eq!(stability.item.school, School::Understanding, "{label:?}");
        assert!((stability.score - 3.575).abs() < 1e-9, "{label:?}");
    }
}

#[test]
fn targets_cap_one_run_then_backfill_to_four() {
    let decisions: Vec<Collectible> = (1..=5)
        .map(|idx| {
            item(&format!("d{idx}"), CollectibleType::Decision, "r1", School::Introduction)
        })
        .collect();
    let state = GameStateForRecs {
        runs: vec![run("r1", "FI-01", School::Introduction, decisions)],
        ..GameStateForRecs::default()
    };
    let picked = ActionDef::new("FI-02", "Introduce Flag", School::Introduction);

    let hand = generate_targets_hand(&state, &picked, &[], NOW);
    assert_eq!(
        ids(&hand.targets, |target| target.id.as_str()),
        vec!["d1", "d2", "d3", "d4"]
    );
    assert!(hand
        .targets
        .iter()
        .all(|entry| entry.basis_tag == BasisTag::RecentOutput));
}

#[test]
fn targets_cap_one_type_across_runs() {
    let state = GameStateForRecs {
        runs: vec![
            run(
                "r1",
                "FI-01",
                School::Introduction,
                vec![
                    item("d1", CollectibleType::Decision, "r1", School::Introduction),
                    item("d2", CollectibleType::Decision, "r1", School::Introduction),
                ],
            ),
            run(
                "r2",
                "FI-02",
                School::Introduction,
                vec![
                    item("d3", CollectibleType::Decision, "r2", School::Introduction),
                    item("d4", CollectibleType::Decision, "r2", School::Introduction),
                    item("p1", CollectibleType::Plan, "r2", School::Introduction),
                ],
            ),
        ],
        ..GameStateForRecs::default()
    };
    let picked = ActionDef::new("FI-03", "Introduce Loader", School::Introduction);

    let hand = generate_targets_hand(&state, &picked, &[], NOW);
    assert_eq!(
        ids(&hand.targets, |target| target.id.as_str()),
        vec!["d3", "d4", "p1", "d1"]
    );
}

#[test]
fn synthesis_targets_evict_the_weakest_for_an_abstraction_keystone() {
    let state = GameStateForRecs {
        active_milestone: Some(enriched()),
        runs: vec![
            run(
                "r1",
                "FA-02",
                School::Abstraction,
                vec![
                    item("fa1", CollectibleType::Decision, "r1", School::Abstraction),
                    item("fa2", CollectibleType::Decision, "r1", School::Abstraction),
                ],
            ),
            run(
                "r2",
                "FS-01",
                School::Synthesis,
                vec![
                    item("b1", CollectibleType::Decision, "r2", School::Synthesis),
                    item("b2", CollectibleType::Decision, "r2", School::Synthesis),
                    item("b3", CollectibleType::Decision, "r2", School::Synthesis),
                ],
            ),
            run(
                "r3",
                "FI-01",
                School::Introduction,
                vec![item("x3", CollectibleType::Plan, "r3", School::Introduction)],
            ),
        ],
        ..GameStateForRecs::default()
    };
    let picked = ActionDef::new("FS-01", "Synthesize Plan", School::Synthesis);
    let composition = ["b1", "b2", "b3"].map(String::from);

    let hand = generate_targets_hand(&state, &picked, &composition, NOW);
    assert_eq!(
        ids(&hand.targets, |target| target.id.as_str()),
        vec!["b1", "b2", "b3", "fa1"]
    );
    let swapped = &hand.targets[3];
    assert_eq!(swapped.basis_tag, BasisTag::RequiresAbstraction);
    assert!((swapped.score - 6.85).abs() < 1e-9);
    assert_eq!(hand.hard_constraints, vec![FS_REQUIRES_FA_NOTICE.to_string()]);
}
