//! Tests for participant conflict severity classification.

use std::collections::BTreeMap;

use overlap_engine::participant::{
    classify_participant_conflicts_with, ApprovalState, SubjectResponse, SubjectRole,
};
use overlap_engine::{
    classify_participant_conflicts, ConflictSeverity, HalfOpenTimeInterval, SeverityPolicy,
    SubjectCommitment,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn candidate() -> HalfOpenTimeInterval {
    HalfOpenTimeInterval::parse("2024-03-04T14:00:00Z", "2024-03-04T15:00:00Z").unwrap()
}

fn commitment(
    start: &str,
    end: &str,
    approval: ApprovalState,
    response: SubjectResponse,
    role: SubjectRole,
) -> SubjectCommitment {
    SubjectCommitment {
        meeting_id: None,
        interval: HalfOpenTimeInterval::parse(start, end).unwrap(),
        other_approval_state: approval,
        subject_response: response,
        subject_role: role,
    }
}

fn overlapping(approval: ApprovalState, response: SubjectResponse) -> SubjectCommitment {
    commitment(
        "2024-03-04T14:30:00Z",
        "2024-03-04T15:30:00Z",
        approval,
        response,
        SubjectRole::Required,
    )
}

fn single(subject: &str, commitments: Vec<SubjectCommitment>) -> BTreeMap<String, Vec<SubjectCommitment>> {
    BTreeMap::from([(subject.to_string(), commitments)])
}

// ── Severity table ──────────────────────────────────────────────────────────

#[test]
fn confirmed_and_accepted_is_high() {
    let input = single("u1", vec![overlapping(ApprovalState::Confirmed, SubjectResponse::Accepted)]);

    let result = classify_participant_conflicts(&candidate(), &input);

    assert!(result.has_conflicts);
    assert_eq!(result.summary.high, 1);
    assert_eq!(result.summary.total(), 1);
    assert_eq!(result.conflicts_for("u1")[0].severity, ConflictSeverity::High);
}

#[test]
fn confirmed_and_unanswered_is_medium() {
    for response in [SubjectResponse::Pending, SubjectResponse::None] {
        let input = single("u1", vec![overlapping(ApprovalState::Confirmed, response)]);
        let result = classify_participant_conflicts(&candidate(), &input);
        assert_eq!(result.summary.medium, 1, "response {:?}", response);
    }
}

#[test]
fn unconfirmed_meeting_is_low_regardless_of_response() {
    for approval in [ApprovalState::Pending, ApprovalState::Draft] {
        for response in [
            SubjectResponse::Accepted,
            SubjectResponse::Declined,
            SubjectResponse::Pending,
            SubjectResponse::None,
        ] {
            let input = single("u1", vec![overlapping(approval, response)]);
            let result = classify_participant_conflicts(&candidate(), &input);
            assert_eq!(
                result.worst_severity(),
                Some(ConflictSeverity::Low),
                "{:?}/{:?}",
                approval,
                response
            );
        }
    }
}

#[test]
fn declined_confirmed_meeting_is_not_a_conflict() {
    let input = single("u1", vec![overlapping(ApprovalState::Confirmed, SubjectResponse::Declined)]);

    let result = classify_participant_conflicts(&candidate(), &input);

    assert!(!result.has_conflicts);
    assert!(result.conflicts_for("u1").is_empty());
}

#[test]
fn cancelled_meeting_is_not_a_conflict() {
    let input = single("u1", vec![overlapping(ApprovalState::Cancelled, SubjectResponse::Accepted)]);
    assert!(!classify_participant_conflicts(&candidate(), &input).has_conflicts);
}

#[test]
fn rejected_meeting_is_not_a_conflict_for_any_response() {
    for response in [
        SubjectResponse::Accepted,
        SubjectResponse::Declined,
        SubjectResponse::Pending,
        SubjectResponse::None,
    ] {
        let input = single("u1", vec![overlapping(ApprovalState::Rejected, response)]);
        assert!(
            !classify_participant_conflicts(&candidate(), &input).has_conflicts,
            "{:?}",
            response
        );
    }
}

#[test]
fn draft_meeting_is_low_for_any_response() {
    for response in [
        SubjectResponse::Accepted,
        SubjectResponse::Declined,
        SubjectResponse::Pending,
        SubjectResponse::None,
    ] {
        let input = single("u1", vec![overlapping(ApprovalState::Draft, response)]);
        let result = classify_participant_conflicts(&candidate(), &input);
        assert_eq!(result.conflicts_for("u1")[0].severity, ConflictSeverity::Low, "{:?}", response);
    }
}

// ── Aggregation ─────────────────────────────────────────────────────────────

#[test]
fn subject_without_commitments_gets_empty_list() {
    let input = single("idle", vec![]);

    let result = classify_participant_conflicts(&candidate(), &input);

    assert!(!result.has_conflicts);
    assert!(result.subjects.contains_key("idle"));
    assert!(result.conflicts_for("idle").is_empty());
    assert_eq!(result.worst_severity(), None);
}

#[test]
fn shared_meeting_counted_once_per_subject() {
    let shared = overlapping(ApprovalState::Confirmed, SubjectResponse::Accepted);
    let input = BTreeMap::from([
        ("u1".to_string(), vec![shared.clone()]),
        ("u2".to_string(), vec![shared]),
        ("u3".to_string(), vec![]),
    ]);

    let result = classify_participant_conflicts(&candidate(), &input);

    assert_eq!(result.summary.high, 2);
    assert_eq!(result.subjects.len(), 3);
}

#[test]
fn conflicts_sorted_by_severity_then_start() {
    let input = single(
        "u1",
        vec![
            commitment(
                "2024-03-04T13:30:00Z",
                "2024-03-04T14:30:00Z",
                ApprovalState::Draft,
                SubjectResponse::None,
                SubjectRole::Optional,
            ),
            commitment(
                "2024-03-04T14:40:00Z",
                "2024-03-04T15:10:00Z",
                ApprovalState::Confirmed,
                SubjectResponse::Accepted,
                SubjectRole::Required,
            ),
            commitment(
                "2024-03-04T14:10:00Z",
                "2024-03-04T14:20:00Z",
                ApprovalState::Confirmed,
                SubjectResponse::Accepted,
                SubjectRole::Required,
            ),
        ],
    );

    let result = classify_participant_conflicts(&candidate(), &input);
    let conflicts = result.conflicts_for("u1");

    let order: Vec<(ConflictSeverity, u32)> = conflicts
        .iter()
        .map(|c| (c.severity, chrono::Timelike::minute(&c.commitment.interval.start())))
        .collect();
    assert_eq!(
        order,
        vec![
            (ConflictSeverity::High, 10),
            (ConflictSeverity::High, 40),
            (ConflictSeverity::Low, 30),
        ]
    );
}

#[test]
fn non_overlapping_commitments_are_dropped() {
    let input = single(
        "u1",
        vec![commitment(
            "2024-03-04T13:00:00Z",
            "2024-03-04T14:00:00Z",
            ApprovalState::Confirmed,
            SubjectResponse::Accepted,
            SubjectRole::Required,
        )],
    );

    assert!(!classify_participant_conflicts(&candidate(), &input).has_conflicts);
}

// ── Policy options ──────────────────────────────────────────────────────────

#[test]
fn role_is_informational_by_default() {
    let mut chair = overlapping(ApprovalState::Pending, SubjectResponse::Accepted);
    chair.subject_role = SubjectRole::Chair;

    let result = classify_participant_conflicts(&candidate(), &single("u1", vec![chair]));

    assert_eq!(result.summary.low, 1);
    assert_eq!(result.conflicts_for("u1")[0].commitment.subject_role, SubjectRole::Chair);
}

#[test]
fn chair_escalation_raises_one_level() {
    let mut chair_low = overlapping(ApprovalState::Draft, SubjectResponse::None);
    chair_low.subject_role = SubjectRole::Chair;
    let mut chair_medium = overlapping(ApprovalState::Confirmed, SubjectResponse::Pending);
    chair_medium.subject_role = SubjectRole::Chair;
    let policy = SeverityPolicy {
        escalate_chair: true,
        ..SeverityPolicy::default()
    };

    let result = classify_participant_conflicts_with(
        &candidate(),
        &single("u1", vec![chair_low, chair_medium]),
        &policy,
    );

    assert_eq!(result.summary.high, 1);
    assert_eq!(result.summary.medium, 1);
    assert_eq!(result.summary.low, 0);
}

#[test]
fn commitment_json_requires_approval_state() {
    let missing = r#"{
        "interval": {"start": "2024-03-04T14:00:00Z", "end": "2024-03-04T15:00:00Z"},
        "subject_response": "accepted"
    }"#;
    assert!(serde_json::from_str::<SubjectCommitment>(missing).is_err());

    let ok = r#"{
        "interval": {"start": "2024-03-04T14:00:00Z", "end": "2024-03-04T15:00:00Z"},
        "other_approval_state": "confirmed"
    }"#;
    let parsed: SubjectCommitment = serde_json::from_str(ok).unwrap();
    assert_eq!(parsed.subject_response, SubjectResponse::None);
    assert_eq!(parsed.subject_role, SubjectRole::Required);
}
