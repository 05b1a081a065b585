//! End-to-end generator scenarios
//!
//! - Linear corridor growth
//! - Exit blocked by a later tile → permanent spawn point
//! - Exhausted candidate pool → exit closed
//! - Invalid exit geometry, forced layouts, frame-driven appends

use std::sync::Arc;

use bevy::math::{IVec2, Vec3};
use tile_chain::constants::OVERLAP_EPSILON;
use tile_chain::exits::{CloseReason, ExitStatus};
use tile_chain::generator::{GeneratorEvent, TaskStep};
use tile_chain::orientation::Orientation;
use tile_chain::{AppendOutcome, GeneratorConfig, GeneratorState, GridGenerator, LayoutLibrary, TileLayout};

// ============================================================
// Helpers
// ============================================================

fn v(x: i32, y: i32) -> IVec2 {
    IVec2::new(x, y)
}

fn layout(name: &str, rows: &[&str], entry: IVec2, exits: &[IVec2]) -> TileLayout {
    TileLayout::from_ascii(name, rows, entry, exits).unwrap()
}

fn straight() -> TileLayout {
    layout("straight", &["###"], v(0, 0), &[v(2, 0)])
}

fn fixed() -> GeneratorConfig {
    GeneratorConfig {
        allow_rotations: false,
        allow_flip: false,
        seed: Some(7),
        ..Default::default()
    }
}

fn generator(config: GeneratorConfig, initial: TileLayout, pool: Vec<TileLayout>) -> GridGenerator {
    let mut gen = GridGenerator::new(config, LayoutLibrary::new(Some(initial), pool));
    gen.generate_first().unwrap();
    gen
}

fn assert_no_overlaps(gen: &GridGenerator) {
    let tiles: Vec<_> = gen.chain().iter().collect();
    for (i, a) in tiles.iter().enumerate() {
        for b in &tiles[i + 1..] {
            assert!(
                !a.bounds.overlaps(&b.bounds, OVERLAP_EPSILON),
                "{} at {:?} overlaps {} at {:?}",
                a.layout.name(),
                a.world_origin,
                b.layout.name(),
                b.world_origin
            );
        }
    }
}

// ============================================================
// 1. Linear corridor
// ============================================================

#[test]
fn test_linear_corridor() {
    let mut gen = generator(fixed(), straight(), vec![straight()]);
    for expected in 1..=3 {
        let outcome = gen.append_next_using_selected_exit();
        assert!(
            matches!(outcome, AppendOutcome::Placed { tile_index, .. } if tile_index == expected),
            "{outcome:?}"
        );
    }
    assert_eq!(gen.chain().len(), 4);
    assert_eq!(gen.exits().open_count(), 1);
    assert_eq!(gen.available_exit_labels(), vec!["A"]);
    let origins: Vec<f32> = gen.chain().iter().map(|t| t.world_origin.x).collect();
    assert_eq!(origins, vec![0.0, 3.0, 6.0, 9.0]);
    assert_no_overlaps(&gen);
    assert_eq!(gen.available_exits(), vec![("A".to_string(), Vec3::new(11.0, 0.0, 0.0))]);
}

#[test]
fn test_tile_gap_spaces_tiles() {
    let config = GeneratorConfig {
        tile_gap: 0.5,
        ..fixed()
    };
    let mut gen = generator(config, straight(), vec![straight()]);
    gen.append_next_using_selected_exit();
    assert_eq!(gen.chain().get(1).world_origin, Vec3::new(3.5, 0.0, 0.0));
}

// ============================================================
// 2. Blocked exit becomes a spawn point
// ============================================================

#[test]
fn test_blocked_exit_becomes_spawn() {
    let bar = layout("bar", &["###"], v(1, 0), &[v(0, 0), v(2, 0)]);
    let mut gen = generator(fixed(), bar, vec![straight()]);
    assert_eq!(gen.available_exit_labels(), vec!["A", "B"]);
    gen.drain_events();

    let blocker = Arc::new(layout("blocker", &["#"], v(0, 0), &[]));
    gen.place_manual(blocker, Vec3::new(-1.0, 0.0, 0.0), Orientation::IDENTITY)
        .unwrap();

    assert_eq!(
        gen.exits().get(0).status,
        ExitStatus::Closed(CloseReason::PermanentSpawn)
    );
    assert_eq!(gen.exits().get(1).status, ExitStatus::Open);
    assert_eq!(gen.available_exit_labels(), vec!["A"]);

    let spawns = gen.permanent_spawn_points();
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].position, Vec3::ZERO);
    // faces back into the network
    assert_eq!(spawns[0].facing, Vec3::X);

    let events = gen.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GeneratorEvent::ExitClosed {
            exit_index: 0,
            reason: CloseReason::PermanentSpawn
        }
    )));
    assert!(events.iter().any(|e| matches!(e, GeneratorEvent::SpawnPointAdded(_))));

    // permanent spawn first, then the remaining open exit
    assert_eq!(gen.spawn_points(), vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)]);
}

#[test]
fn test_manual_overlap_rejected() {
    let mut gen = generator(fixed(), straight(), vec![straight()]);
    let result = gen.place_manual(Arc::new(straight()), Vec3::new(1.0, 0.0, 0.0), Orientation::IDENTITY);
    assert!(result.is_err());
    assert_eq!(gen.chain().len(), 1);
}

fn forecourt() -> TileLayout {
    // two exits facing -Z, entry on the far edge
    layout("forecourt", &["#.#", "###"], v(1, 1), &[v(0, 0), v(2, 0)])
}

fn awning() -> TileLayout {
    // entered from +Z, wide enough to cover the cell past the second exit
    layout("awning", &["###", "#.#"], v(0, 1), &[])
}

fn assert_awning_closes_second_exit(gen: &GridGenerator) {
    assert_eq!(gen.chain().len(), 2);
    assert_eq!(gen.exits().get(0).status, ExitStatus::Used);
    assert_eq!(
        gen.exits().get(1).status,
        ExitStatus::Closed(CloseReason::PermanentSpawn)
    );
    assert!(gen.available_exits().is_empty());
    let spawns = gen.permanent_spawn_points();
    assert_eq!(spawns.len(), 1);
    assert_eq!(spawns[0].position, Vec3::new(2.0, 0.0, 0.0));
    assert_eq!(spawns[0].facing, Vec3::Z);
}

#[test]
fn test_append_closes_earlier_tile_exit() {
    let mut gen = generator(fixed(), forecourt(), vec![awning()]);
    assert_eq!(gen.available_exit_labels(), vec!["A", "B"]);

    let outcome = gen.append_next_using_selected_exit();
    assert!(matches!(outcome, AppendOutcome::Placed { tile_index: 1, .. }), "{outcome:?}");
    assert_eq!(gen.chain().get(1).world_origin, Vec3::new(0.0, 0.0, -2.0));
    assert_awning_closes_second_exit(&gen);
    assert_no_overlaps(&gen);
}

#[test]
fn test_forced_append_closes_earlier_tile_exit() {
    let awning = Arc::new(awning());
    let mut gen = generator(fixed(), forecourt(), vec![straight()]);

    let outcome = gen.append_next_using_selected_exit_with_layout(&awning);
    assert!(matches!(outcome, AppendOutcome::Placed { tile_index: 1, .. }), "{outcome:?}");
    assert_awning_closes_second_exit(&gen);
}

#[test]
fn test_initial_tile_keeps_exit_on_entry_cell() {
    let bar = layout("bar", &["###"], v(0, 0), &[v(0, 0), v(2, 0)]);
    let mut gen = generator(fixed(), bar.clone(), vec![bar]);
    assert_eq!(gen.exits().len(), 2);
    assert_eq!(gen.available_exit_labels(), vec!["A", "B"]);
    assert_eq!(gen.available_exits()[0].1, Vec3::ZERO);

    // an attached tile's entry is consumed by the connection
    gen.set_exit_index(1);
    let outcome = gen.append_next_using_selected_exit();
    assert!(matches!(outcome, AppendOutcome::Placed { tile_index: 1, .. }), "{outcome:?}");
    assert_eq!(gen.exits().len(), 3);
    assert!(!gen
        .exits()
        .iter()
        .any(|rec| rec.tile_index == 1 && rec.cell == v(0, 0)));
    assert_eq!(gen.available_exit_labels(), vec!["A", "B"]);
}

// ============================================================
// 3. Exhausted candidates close the exit
// ============================================================

#[test]
fn test_exhausted_candidates_close_exit() {
    let west_entry = layout("west_entry", &["###"], v(2, 0), &[v(0, 0)]);
    let mut gen = generator(fixed(), straight(), vec![west_entry]);
    let outcome = gen.append_next_using_selected_exit();
    assert_eq!(
        outcome,
        AppendOutcome::ExitClosed {
            exit_index: 0,
            reason: CloseReason::NoCandidate
        }
    );
    assert!(gen.available_exits().is_empty());
    assert_eq!(gen.state(), GeneratorState::Stalled);
    assert_eq!(gen.selected_exit(), 0);
    assert_eq!(gen.append_next_using_selected_exit(), AppendOutcome::NoExit);

    // fallback to the last tile's layout exits
    assert_eq!(gen.spawn_points(), vec![Vec3::new(2.0, 0.0, 0.0)]);
    assert_eq!(gen.next_spawn_round_robin(), Some(Vec3::new(2.0, 0.05, 0.0)));
}

#[test]
fn test_rotation_rescues_candidate() {
    let west_entry = layout("west_entry", &["###"], v(2, 0), &[v(0, 0)]);
    let config = GeneratorConfig {
        allow_rotations: true,
        ..fixed()
    };
    let mut gen = generator(config, straight(), vec![west_entry]);
    let outcome = gen.append_next_using_selected_exit();
    assert!(matches!(outcome, AppendOutcome::Placed { tile_index: 1, .. }), "{outcome:?}");
    assert_no_overlaps(&gen);
}

// ============================================================
// 4. Invalid exit geometry
// ============================================================

#[test]
fn test_ambiguous_exit_is_closed() {
    // exit (0, 0) has two path neighbours
    let initial = layout("split", &["###", "##."], v(2, 0), &[v(0, 0)]);
    let mut gen = generator(fixed(), initial, vec![straight()]);
    assert_eq!(gen.exits().open_count(), 1);
    assert_eq!(gen.selected_exit_world(), None);
    assert!(gen.placement_previews().is_empty());
    assert_eq!(
        gen.append_next_using_selected_exit(),
        AppendOutcome::ExitClosed {
            exit_index: 0,
            reason: CloseReason::InvalidGeometry
        }
    );
    assert_eq!(gen.state(), GeneratorState::Stalled);
}

// ============================================================
// 5. Forced-template append
// ============================================================

#[test]
fn test_forced_layout_attaches_at_exit() {
    let config = GeneratorConfig {
        allow_rotations: true,
        ..fixed()
    };
    let corner = Arc::new(layout("corner", &["##", ".#"], v(0, 0), &[v(1, 1)]));
    let mut gen = generator(config, straight(), vec![straight()]);
    let outcome = gen.append_next_using_selected_exit_with_layout(&corner);
    assert!(matches!(outcome, AppendOutcome::Placed { tile_index: 1, .. }), "{outcome:?}");
    let placed = gen.chain().get(1);
    assert_eq!(placed.layout.name(), "corner");
    // entry cell lands one step past the exit at (2, 0, 0)
    let entry_world = placed.cell_world(gen.orientation_service(), placed.layout.entry());
    assert_eq!(entry_world, Vec3::new(3.0, 0.0, 0.0));
    assert_no_overlaps(&gen);
}

#[test]
fn test_forced_layout_that_never_fits_closes_exit() {
    let west_entry = Arc::new(layout("west_entry", &["###"], v(2, 0), &[v(0, 0)]));
    let mut gen = generator(fixed(), straight(), vec![(*west_entry).clone()]);
    let outcome = gen.append_next_using_selected_exit_with_layout(&west_entry);
    assert!(matches!(
        outcome,
        AppendOutcome::ExitClosed {
            reason: CloseReason::NoCandidate,
            ..
        }
    ));
}

#[test]
fn test_forced_layout_keeps_exit_when_pool_fits() {
    let west_entry = Arc::new(layout("west_entry", &["###"], v(2, 0), &[v(0, 0)]));
    let mut gen = generator(fixed(), straight(), vec![straight()]);
    let outcome = gen.append_next_using_selected_exit_with_layout(&west_entry);
    assert_eq!(outcome, AppendOutcome::Retry);
    assert_eq!(gen.exits().open_count(), 1);
}

// ============================================================
// 6. Budgeted retries and the frame-driven task
// ============================================================

fn crowded(tries: u32) -> GridGenerator {
    let long = layout("long", &["###"], v(0, 0), &[v(2, 0)]);
    let stub = layout("stub", &["#"], v(0, 0), &[]);
    let config = GeneratorConfig {
        connection_tries: tries,
        ..fixed()
    };
    let mut gen = generator(config, straight(), vec![long, stub]);
    let blocker = Arc::new(layout("blocker", &["#"], v(0, 0), &[]));
    gen.place_manual(blocker, Vec3::new(5.0, 0.0, 0.0), Orientation::IDENTITY)
        .unwrap();
    gen
}

#[test]
fn test_retry_leaves_state_untouched() {
    let mut gen = crowded(1);
    let mut placed = false;
    for _ in 0..64 {
        match gen.append_next_using_selected_exit() {
            AppendOutcome::Retry => assert_eq!(gen.chain().len(), 2),
            AppendOutcome::Placed { .. } => {
                placed = true;
                break;
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    assert!(placed);
    assert_eq!(gen.chain().last().unwrap().layout.name(), "stub");
}

#[test]
fn test_task_spends_one_attempt_per_step() {
    let mut gen = crowded(24);
    let mut task = gen.begin_append();
    let mut steps = 0;
    let outcome = loop {
        steps += 1;
        match task.step(&mut gen) {
            TaskStep::Pending { attempts } => assert_eq!(attempts, 1),
            TaskStep::Finished(outcome) => break outcome,
        }
    };
    assert!(steps <= 2);
    assert!(matches!(outcome, AppendOutcome::Placed { .. }));
    assert_eq!(gen.chain().last().unwrap().layout.name(), "stub");
}

#[test]
fn test_task_notices_exit_closed_elsewhere() {
    let mut gen = crowded(24);
    let mut task = gen.begin_append();
    if let TaskStep::Pending { .. } = task.step(&mut gen) {
        // the blocking append consumes the same exit first
        let _ = gen.append_next_using_selected_exit_with_layout(&Arc::new(layout("stub", &["#"], v(0, 0), &[])));
        assert_eq!(task.step(&mut gen), TaskStep::Finished(AppendOutcome::NoExit));
    }
}

// ============================================================
// 7. Determinism & queries
// ============================================================

fn grow(seed: u64, appends: usize) -> Vec<(String, Vec3, Orientation)> {
    let mut gen = GridGenerator::new(GeneratorConfig::default().with_seed(seed), LayoutLibrary::builtin());
    gen.generate_first().unwrap();
    for i in 0..appends {
        let open = gen.exits().open_count();
        if open == 0 {
            break;
        }
        gen.set_exit_index(i % open);
        gen.append_next_using_selected_exit();
    }
    assert_no_overlaps(&gen);
    gen.chain()
        .iter()
        .map(|t| (t.layout.name().to_string(), t.world_origin, t.orientation))
        .collect()
}

#[test]
fn test_same_seed_same_chain() {
    assert_eq!(grow(99, 20), grow(99, 20));
}

#[test]
fn test_hub_core_and_round_robin() {
    let mut gen = GridGenerator::new(fixed(), LayoutLibrary::builtin());
    gen.generate_first().unwrap();
    assert_eq!(gen.core_position(), Some(Vec3::new(1.0, 0.0, 1.0)));
    let points = gen.spawn_points();
    assert_eq!(points.len(), 3);
    let picks: Vec<Vec3> = (0..4).filter_map(|_| gen.next_spawn_round_robin()).collect();
    assert_eq!(picks[0], picks[3]);
    assert!(picks.iter().all(|p| (p.y - 0.05).abs() < 1e-6));
}

#[test]
fn test_select_exit_by_label() {
    let mut gen = GridGenerator::new(fixed(), LayoutLibrary::builtin());
    gen.generate_first().unwrap();
    assert!(gen.set_exit_by_label("C"));
    assert_eq!(gen.selected_exit(), 2);
    assert!(!gen.set_exit_by_label("Z"));
    assert_eq!(gen.selected_exit(), 2);
}

#[test]
fn test_current_tile_queries() {
    let mut gen = GridGenerator::new(fixed(), LayoutLibrary::builtin());
    assert_eq!(gen.current_layout().map(|l| l.name()), Some("hub"));
    assert_eq!(gen.current_world_origin(), Vec3::ZERO);
    gen.generate_first().unwrap();
    assert_eq!(gen.current_orientation(), Orientation::IDENTITY);
}

#[test]
fn test_cleanup_keeps_spawn_points() {
    let bar = layout("bar", &["###"], v(1, 0), &[v(0, 0), v(2, 0)]);
    let mut gen = generator(fixed(), bar, vec![straight()]);
    gen.place_manual(
        Arc::new(layout("blocker", &["#"], v(0, 0), &[])),
        Vec3::new(-1.0, 0.0, 0.0),
        Orientation::IDENTITY,
    )
    .unwrap();
    gen.cleanup_caches();
    assert_eq!(gen.state(), GeneratorState::Uninitialized);
    assert_eq!(gen.permanent_spawn_points().len(), 1);
    gen.reset();
    assert!(gen.permanent_spawn_points().is_empty());
}
