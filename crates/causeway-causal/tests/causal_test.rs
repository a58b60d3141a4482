//! Conflict detection, resolution, and replay ordering over realistic
//! offline batches.

use causeway_causal::{detect_conflicts, ClockComparator, ClockOrdering, ConflictResolver, TemporalReorderer};
use causeway_core::models::ConflictStrategy;
use chrono::Duration;
use test_fixtures::{base_time, clocked, record};

// =============================================================================
// Two clients editing the same task offline
// =============================================================================

#[test]
fn concurrent_offline_edits_resolve_by_last_write() {
    let mut from_a = clocked(1, 1, &[("A", 1)]);
    let mut from_b = clocked(2, 2, &[("B", 1)]);
    from_a.created_at = base_time();
    from_b.created_at = base_time() + Duration::seconds(5);

    assert_eq!(
        ClockComparator::compare_opt(from_a.vector_clock.as_ref(), from_b.vector_clock.as_ref()),
        Some(ClockOrdering::Concurrent)
    );

    let conflicts = detect_conflicts(&[from_a.clone(), from_b.clone()]);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].target_id, "task-1");
    assert_eq!((conflicts[0].left, conflicts[0].right), (1, 2));

    let resolution = ConflictResolver::resolve(&from_a, &from_b, ConflictStrategy::LastWriteWins);
    assert_eq!(resolution.winner, Some(2));
    assert_eq!(resolution.loser, Some(1));
    assert!(!resolution.review_required);
}

#[test]
fn causally_related_edits_are_not_conflicts() {
    let first = clocked(1, 1, &[("A", 1)]);
    let second = clocked(2, 2, &[("A", 1), ("B", 1)]);
    assert!(detect_conflicts(&[first, second]).is_empty());
}

#[test]
fn different_targets_never_conflict() {
    let a = clocked(1, 1, &[("A", 1)]);
    let mut b = clocked(2, 2, &[("B", 1)]);
    b.target_id = Some("task-2".to_string());
    assert!(detect_conflicts(&[a, b]).is_empty());
}

#[test]
fn clockless_and_superseded_records_are_skipped() {
    let a = clocked(1, 1, &[("A", 1)]);
    let server = record(2, 2);
    let mut loser = clocked(3, 3, &[("B", 1)]);
    loser.superseded_by = Some(1);
    assert!(detect_conflicts(&[a, server, loser]).is_empty());
}

#[test]
fn three_way_concurrency_reports_every_pair() {
    let batch = vec![
        clocked(1, 1, &[("A", 1)]),
        clocked(2, 2, &[("B", 1)]),
        clocked(3, 3, &[("C", 1)]),
    ];
    let mut pairs: Vec<_> = detect_conflicts(&batch)
        .into_iter()
        .map(|p| (p.left, p.right))
        .collect();
    pairs.sort();
    assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
}

// =============================================================================
// Resolver strategies
// =============================================================================

#[test]
fn server_wins_keeps_earlier_record() {
    let a = clocked(7, 7, &[("A", 1)]);
    let b = clocked(9, 9, &[("B", 1)]);
    let r = ConflictResolver::resolve(&b, &a, ConflictStrategy::ServerWins);
    assert_eq!(r.winner, Some(7));
    assert_eq!(r.loser, Some(9));
}

#[test]
fn client_wins_keeps_later_record() {
    let a = clocked(7, 7, &[("A", 1)]);
    let b = clocked(9, 9, &[("B", 1)]);
    let r = ConflictResolver::resolve(&a, &b, ConflictStrategy::ClientWins);
    assert_eq!(r.winner, Some(9));
    assert_eq!(r.loser, Some(7));
}

#[test]
fn last_write_ties_fall_back_to_sequence() {
    let mut a = clocked(1, 4, &[("A", 1)]);
    let mut b = clocked(2, 3, &[("B", 1)]);
    a.created_at = base_time();
    b.created_at = base_time();
    let r = ConflictResolver::resolve(&a, &b, ConflictStrategy::LastWriteWins);
    assert_eq!(r.winner, Some(1));
}

#[test]
fn merge_picks_a_winner_and_flags_review() {
    let a = clocked(1, 1, &[("A", 1)]);
    let b = clocked(2, 2, &[("B", 1)]);
    let r = ConflictResolver::resolve(&a, &b, ConflictStrategy::Merge);
    assert_eq!(r.winner, Some(2));
    assert!(r.review_required);
}

#[test]
fn manual_leaves_both_unresolved() {
    let a = clocked(1, 1, &[("A", 1)]);
    let b = clocked(2, 2, &[("B", 1)]);
    let r = ConflictResolver::resolve(&a, &b, ConflictStrategy::Manual);
    assert!(r.is_manual());
    assert_eq!(r.winner, None);
    assert_eq!(r.loser, None);
    assert!(r.review_required);

    let note = ConflictResolver::review_message(&a, &b, ConflictStrategy::Manual);
    assert!(note.contains("#2"));
    assert!(note.contains("task-1"));
}

// =============================================================================
// Replay ordering
// =============================================================================

#[test]
fn single_client_batch_is_restored_to_clock_order() {
    // Arrived out of order; sequence numbers follow arrival.
    let batch = vec![
        clocked(1, 1, &[("A", 2)]),
        clocked(2, 2, &[("A", 3)]),
        clocked(3, 3, &[("A", 1)]),
    ];
    let ordered = TemporalReorderer::reorder(batch);
    let counters: Vec<u64> = ordered
        .iter()
        .map(|r| r.vector_clock.as_ref().map(|c| c.get("A")).unwrap_or(0))
        .collect();
    assert_eq!(counters, vec![1, 2, 3]);
    assert!(TemporalReorderer::is_causally_sorted(&ordered));
}

#[test]
fn already_sorted_batch_is_untouched() {
    let batch = vec![
        record(1, 1),
        clocked(2, 2, &[("A", 1)]),
        clocked(3, 3, &[("B", 1)]),
        record(4, 4),
        clocked(5, 5, &[("A", 2), ("B", 1)]),
    ];
    let ids: Vec<_> = batch.iter().map(|r| r.id).collect();
    let ordered = TemporalReorderer::reorder(batch);
    assert_eq!(ordered.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
}

#[test]
fn clockless_records_follow_sequence_order() {
    let batch = vec![record(3, 30), record(1, 10), record(2, 20)];
    let ordered = TemporalReorderer::reorder(batch);
    assert_eq!(ordered.iter().map(|r| r.sequence_num).collect::<Vec<_>>(), vec![10, 20, 30]);
}

#[test]
fn empty_and_single_batches_pass_through() {
    assert!(TemporalReorderer::reorder(Vec::new()).is_empty());
    let one = TemporalReorderer::reorder(vec![record(1, 1)]);
    assert_eq!(one.len(), 1);
}
