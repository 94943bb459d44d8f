use sheet_leaderboard::reconcile::ParticipantModel;
use sheet_leaderboard::rotation::{CursorPhase, RotationCursor};

fn model_with_rounds(max_rounds: usize) -> ParticipantModel {
    ParticipantModel {
        max_rounds,
        ..ParticipantModel::default()
    }
}

#[test]
fn cursor_wraps_around_max_rounds() {
    let model = model_with_rounds(3);
    let mut cursor = RotationCursor::new();
    assert_eq!(cursor.current_round(&model), Some(0));
    for _ in 0..5 {
        cursor.advance();
    }
    assert_eq!(cursor.index(), 5);
    assert_eq!(cursor.current_round(&model), Some(2));
}

#[test]
fn refresh_folds_index_into_new_range() {
    let mut cursor = RotationCursor::with_index(7);
    cursor.reconcile_after_refresh(3);
    assert_eq!(cursor.index(), 1);
}

#[test]
fn refresh_without_rounds_keeps_index() {
    let mut cursor = RotationCursor::with_index(7);
    cursor.reconcile_after_refresh(0);
    assert_eq!(cursor.index(), 7);

    let idle = model_with_rounds(0);
    assert_eq!(cursor.current_round(&idle), None);
    assert_eq!(cursor.phase(&idle), CursorPhase::Idle);

    let recovered = model_with_rounds(4);
    cursor.reconcile_after_refresh(4);
    assert_eq!(cursor.phase(&recovered), CursorPhase::Rotating);
    assert_eq!(cursor.current_round(&recovered), Some(3));
}

#[test]
fn change_latch_fires_once_per_round_change() {
    let model = model_with_rounds(2);
    let mut cursor = RotationCursor::new();

    assert!(cursor.did_change(&model));
    assert_eq!(cursor.last_displayed(), Some(0));
    assert!(!cursor.did_change(&model));

    cursor.advance();
    assert!(cursor.did_change(&model));
    assert!(!cursor.did_change(&model));

    // back to round 0 after wrapping
    cursor.advance();
    assert!(cursor.did_change(&model));
    assert_eq!(cursor.last_displayed(), Some(0));
}

#[test]
fn single_round_never_signals_after_first_pass() {
    let model = model_with_rounds(1);
    let mut cursor = RotationCursor::new();
    assert!(cursor.did_change(&model));
    for _ in 0..3 {
        cursor.advance();
        assert!(!cursor.did_change(&model));
    }
}

#[test]
fn going_idle_is_a_change() {
    let rotating = model_with_rounds(2);
    let idle = model_with_rounds(0);
    let mut cursor = RotationCursor::new();
    assert!(cursor.did_change(&rotating));
    assert!(cursor.did_change(&idle));
    assert_eq!(cursor.last_displayed(), None);
}
