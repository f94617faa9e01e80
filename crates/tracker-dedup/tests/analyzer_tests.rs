//! Integration tests for the pending command analyzer
//!
//! These tests verify end-to-end behavior of the analyzer including:
//! - Decoding of enveloped frames before comparison
//! - Volume-cap boundary
//! - Agreement between per-device decisions and the eligibility sets
//! - Independence of the decisions from row order

use std::collections::BTreeSet;

use tracker_dedup::{Decision, PendingCommandAnalyzer, RawCommandRow};
use tracker_protocol::{compare, DeviceId, Verdict};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const CANDIDATE: &str = "AT+TIMEGAP=0,600,1,600 & AT+SAMPLEMODE=0,0";

    pub fn device(n: u32) -> String {
        format!("8600000000{:05}", n)
    }

    pub fn id(raw: &str) -> DeviceId {
        DeviceId::normalize(raw).unwrap()
    }

    pub fn row(imei: &str, msg: &str, state: i64) -> RawCommandRow {
        RawCommandRow {
            imei: imei.to_string(),
            msg: msg.to_string(),
            state,
            created_date: 1_700_000_000,
        }
    }

    pub fn envelope(command: &str, checksum: &str) -> String {
        let payload: String = command.bytes().map(|b| format!("{:02X}", b)).collect();
        format!("7E{}{}{}7E", "0".repeat(36), payload, checksum)
    }

    /// Decisions must agree with the eligibility rule for every device
    pub fn assert_consistent(result: &tracker_dedup::AnalysisResult) {
        for (device, analysis) in &result.analyses {
            assert_eq!(
                result.is_eligible(device),
                analysis.decision == Decision::SendCommand,
                "decision and eligibility disagree for {}",
                device
            );
        }
    }
}

use helpers::*;

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn enveloped_equivalent_interval_is_suppressed() {
    let d1 = device(1);
    let frame = envelope("AT+TIMEGAP=0,600,1,600", "xx");
    let rows = vec![row(&d1, &frame, 0)];
    let ids = BTreeSet::from([id(&d1)]);

    let result = PendingCommandAnalyzer::new().analyze(&ids, &rows, Some(CANDIDATE));
    let analysis = result.analysis(&id(&d1)).unwrap();

    assert_eq!(analysis.commands[0].command, "AT+TIMEGAP=0,600,1,600");
    assert_eq!(
        compare(&analysis.commands[0].command, CANDIDATE),
        Verdict::EquivalentInterval
    );
    assert_eq!(analysis.decision, Decision::DoNotSend);
    assert_eq!(analysis.reason, "Equivalent interval command found");
    assert_eq!(result.pending_commands_info[&id(&d1)][0].original, frame);
    assert_consistent(&result);
}

#[test]
fn three_pending_rows_still_send() {
    let d1 = device(1);
    let rows: Vec<_> = (0..3).map(|_| row(&d1, "AT+RESET", 0)).collect();
    let ids = BTreeSet::from([id(&d1)]);

    let result = PendingCommandAnalyzer::new().analyze(&ids, &rows, Some(CANDIDATE));
    assert_eq!(result.decision(&id(&d1)), Some(Decision::SendCommand));
    assert_consistent(&result);
}

#[test]
fn four_pending_rows_suppress() {
    let d1 = device(1);
    let rows: Vec<_> = (0..4).map(|_| row(&d1, "AT+RESET", 1)).collect();
    let ids = BTreeSet::from([id(&d1)]);

    let result = PendingCommandAnalyzer::new().analyze(&ids, &rows, Some(CANDIDATE));
    let analysis = result.analysis(&id(&d1)).unwrap();
    assert_eq!(analysis.decision, Decision::DoNotSend);
    assert!(analysis.reason.contains('4'));
    assert_consistent(&result);
}

#[test]
fn mixed_fleet() {
    let (d1, d2, d3, d4) = (device(1), device(2), device(3), device(4));
    let rows = vec![
        row(&d1, CANDIDATE, 0),
        row(&d2, "AT+TIMEGAP=0,300,1,300", 1),
        row(&d3, "AT+RESET", 0),
    ];
    let ids: BTreeSet<_> = [&d1, &d2, &d3, &d4].iter().map(|d| id(d)).collect();

    let result = PendingCommandAnalyzer::new().analyze(&ids, &rows, Some(CANDIDATE));

    assert_eq!(result.eligible_devices(), vec![id(&d3), id(&d4)]);
    assert_eq!(result.suppressed_count(), 2);
    assert_consistent(&result);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn command() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(CANDIDATE.to_string()),
            Just("AT+TIMEGAP=0,600,1,600".to_string()),
            Just("AT+TIMEGAP=0,300,1,300".to_string()),
            Just("AT+TIMEGAP?".to_string()),
            Just("AT+RESET".to_string()),
            Just("AT+SAMPLEMODE=0,0".to_string()),
            "AT\\+[A-Z]{2,8}=[0-9]{1,3}",
        ]
    }

    fn rows() -> impl Strategy<Value = Vec<RawCommandRow>> {
        prop::collection::vec(
            (
                0u32..5,
                command(),
                prop_oneof![Just(0i64), Just(1i64), Just(5i64)],
                any::<bool>(),
            ),
            0..16,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(n, cmd, state, wrap)| {
                    let msg = if wrap { envelope(&cmd, "00") } else { cmd };
                    row(&device(n), &msg, state)
                })
                .collect()
        })
    }

    fn requested() -> BTreeSet<DeviceId> {
        (0..4).map(|n| id(&device(n))).collect()
    }

    proptest! {
        #[test]
        fn decisions_match_eligibility(rows in rows(), with_candidate in any::<bool>()) {
            let candidate = with_candidate.then_some(CANDIDATE);
            let result = PendingCommandAnalyzer::new().analyze(&requested(), &rows, candidate);
            for (device, analysis) in &result.analyses {
                prop_assert_eq!(
                    result.is_eligible(device),
                    analysis.decision == Decision::SendCommand
                );
            }
        }

        #[test]
        fn decisions_independent_of_row_order(
            (rows, shuffled) in rows().prop_flat_map(|rows| {
                let shuffled = Just(rows.clone()).prop_shuffle();
                (Just(rows), shuffled)
            })
        ) {
            let analyzer = PendingCommandAnalyzer::new();
            let a = analyzer.analyze(&requested(), &rows, Some(CANDIDATE));
            let b = analyzer.analyze(&requested(), &shuffled, Some(CANDIDATE));

            for device in requested() {
                prop_assert_eq!(a.decision(&device), b.decision(&device));
            }
            prop_assert_eq!(a.pending_counts, b.pending_counts);
        }

        #[test]
        fn command_count_matches_rows(rows in rows()) {
            let result = PendingCommandAnalyzer::new().analyze(&requested(), &rows, None);
            for (device, analysis) in &result.analyses {
                let expected = rows
                    .iter()
                    .filter(|r| r.state != 5 && id(&r.imei) == *device)
                    .count();
                prop_assert_eq!(analysis.command_count, expected);
                prop_assert_eq!(analysis.commands.len(), expected);
                prop_assert_eq!(analysis.has_pending_commands, expected > 0);
            }
        }

        #[test]
        fn unrequested_devices_never_analyzed(rows in rows()) {
            let result = PendingCommandAnalyzer::new().analyze(&requested(), &rows, Some(CANDIDATE));
            prop_assert!(!result.analyses.contains_key(&id(&device(4))));
            prop_assert!(!result.pending_counts.contains_key(&id(&device(4))));
        }
    }
}
