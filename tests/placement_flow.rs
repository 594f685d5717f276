mod common;

use common::app::spawn_core;
use common::fixtures::{seed_spectrum, seed_word};

use vocab_core::clock::Deadline;
use vocab_core::error::CoreError;

const LEARNER: &str = "learner-1";

/// Scenario: a learner whose real level is around 60 converges to 61 in
/// seven questions, with the fifth question flagged as a regression probe.
#[tokio::test]
async fn placement_converges_on_level_61() {
    let t = spawn_core();
    seed_spectrum(t.core.store());
    let deadline = Deadline::none();

    let round = t.core.placement_start(LEARNER, deadline).await.unwrap();
    assert!(!round.is_complete);
    assert!(!round.is_regression_probe);
    assert_eq!(round.word.as_ref().unwrap().difficulty_rank, 50);
    assert_eq!(round.session.current_min, 1);
    assert_eq!(round.session.current_max, 100);

    // (answer, expected next rank, expected probe flag, expected bounds after answer)
    let steps = [
        (true, 75, false, (51, 100)),
        (false, 63, false, (51, 75)),
        (false, 57, false, (51, 63)),
        (true, 46, true, (58, 63)),
        (true, 60, false, (58, 63)),
        (true, 62, false, (61, 63)),
    ];

    for (answer, next_rank, next_is_probe, (min, max)) in steps {
        let round = t.core.placement_answer(LEARNER, answer, deadline).await.unwrap();
        assert!(!round.is_complete);
        assert_eq!(round.session.current_min, min);
        assert_eq!(round.session.current_max, max);
        assert_eq!(round.word.as_ref().unwrap().difficulty_rank, next_rank);
        assert_eq!(round.is_regression_probe, next_is_probe);
    }

    let last = t.core.placement_answer(LEARNER, false, deadline).await.unwrap();
    assert!(last.is_complete);
    assert_eq!(last.final_level, Some(61));
    assert_eq!(last.session.current_min, 61);
    assert_eq!(last.session.current_max, 62);
    assert!(!last.session.is_active);
    assert_eq!(last.session.question_count, 7);

    // The full answer trail is kept, no word is shown twice, and only the
    // fifth question carried the probe flag.
    assert_eq!(last.session.log.len(), 7);
    let mut ids: Vec<_> = last.session.log.iter().map(|a| a.word_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 7);
    let probe_positions: Vec<_> = last
        .session
        .log
        .iter()
        .enumerate()
        .filter(|(_, a)| a.was_regression_probe)
        .map(|(i, _)| i + 1)
        .collect();
    assert_eq!(probe_positions, vec![5]);

    // Completion frees the slot: a new start opens a fresh session.
    let fresh = t.core.placement_start(LEARNER, deadline).await.unwrap();
    assert_ne!(fresh.session.id, last.session.id);
}

/// Scenario: starting twice without answering returns the same session,
/// the same question, and an unchanged question count.
#[tokio::test]
async fn start_is_idempotent() {
    let t = spawn_core();
    seed_spectrum(t.core.store());
    let deadline = Deadline::none();

    let first = t.core.placement_start(LEARNER, deadline).await.unwrap();
    let second = t.core.placement_start(LEARNER, deadline).await.unwrap();

    assert_eq!(first.session.id, second.session.id);
    assert_eq!(
        first.word.as_ref().unwrap().id,
        second.word.as_ref().unwrap().id
    );
    assert_eq!(second.session.question_count, 0);

    let current = t
        .core
        .placement_current(LEARNER, deadline)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.id, first.session.id);
}

#[tokio::test]
async fn answer_without_session_is_not_found() {
    let t = spawn_core();
    seed_spectrum(t.core.store());

    let err = t
        .core
        .placement_answer(LEARNER, true, Deadline::none())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    assert!(t
        .core
        .placement_current(LEARNER, Deadline::none())
        .await
        .unwrap()
        .is_none());
}

/// A catalog too small to keep asking questions finalizes the session with
/// the current midpoint instead of looping.
#[tokio::test]
async fn exhausted_catalog_finalizes_placement() {
    let t = spawn_core();
    seed_word(t.core.store(), "only-a", 1, 40);
    seed_word(t.core.store(), "only-b", 1, 70);
    let deadline = Deadline::none();

    let mut round = t.core.placement_start(LEARNER, deadline).await.unwrap();
    let mut guard = 0;
    while !round.is_complete {
        round = t.core.placement_answer(LEARNER, true, deadline).await.unwrap();
        guard += 1;
        assert!(guard <= 3, "two words can support at most two questions");
    }

    assert!(round.final_level.is_some());
    assert!(!round.session.is_active);
    assert!(t
        .core
        .placement_current(LEARNER, deadline)
        .await
        .unwrap()
        .is_none());
}

/// Placement invariants hold at every observable state, for any answer
/// pattern: bounds ordered inside [1,100], question budget respected,
/// every fifth question probe-flagged.
#[tokio::test]
async fn bounds_and_probe_cadence_hold_for_alternating_answers() {
    let t = spawn_core();
    seed_spectrum(t.core.store());
    let deadline = Deadline::none();

    let mut round = t.core.placement_start(LEARNER, deadline).await.unwrap();
    let mut position = 1;
    while !round.is_complete {
        assert_eq!(round.is_regression_probe, position % 5 == 0);
        let answer = position % 2 == 0;
        round = t.core.placement_answer(LEARNER, answer, deadline).await.unwrap();

        let s = &round.session;
        assert!(1 <= s.current_min && s.current_min <= s.current_max && s.current_max <= 100);
        assert!(s.question_count <= 20);
        position += 1;
    }
    assert_eq!(
        round.final_level,
        Some((round.session.current_min + round.session.current_max) / 2)
    );
}
