//! Participant schedule-conflict classification.
//!
//! For a candidate meeting slot, each invited subject's other commitments are
//! graded by a [`SeverityPolicy`]: an ordered rule table over the other
//! meeting's approval state and the subject's own response, first match wins.
//!
//! | other meeting | subject response | severity |
//! |---------------|------------------|----------|
//! | confirmed     | accepted         | HIGH     |
//! | confirmed     | pending / none   | MEDIUM   |
//! | pending/draft | any              | LOW      |
//!
//! A commitment matching no rule (a declined confirmed meeting, a rejected or
//! cancelled meeting) is not a conflict. Role is carried through for display
//! and only changes severity when chair escalation is switched on.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interval::HalfOpenTimeInterval;
use crate::overlap::Overlap;

/// Approval state of the other meeting.
///
/// Only `Pending` and `Draft` count as unconfirmed. `Rejected` and `Cancelled`
/// meetings will not take place, so no default rule matches them and they are
/// never reported as conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Confirmed,
    Pending,
    Draft,
    /// Turned down by its approver.
    Rejected,
    /// Withdrawn by its organiser.
    Cancelled,
}

/// The subject's own answer to the other meeting's invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectResponse {
    Accepted,
    Declined,
    Pending,
    #[default]
    None,
}

/// The subject's role in the other meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRole {
    Chair,
    #[default]
    Required,
    Optional,
}

/// How actionable a conflict is. Ordered so that `High` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl ConflictSeverity {
    fn escalated(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        };
        f.write_str(label)
    }
}

/// Another engagement of a subject that may clash with the candidate slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCommitment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,
    pub interval: HalfOpenTimeInterval,
    pub other_approval_state: ApprovalState,
    #[serde(default)]
    pub subject_response: SubjectResponse,
    #[serde(default)]
    pub subject_role: SubjectRole,
}

/// One row of the severity table. An empty list matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityRule {
    #[serde(default)]
    pub approval: Vec<ApprovalState>,
    #[serde(default)]
    pub responses: Vec<SubjectResponse>,
    pub severity: ConflictSeverity,
}

impl SeverityRule {
    fn matches(&self, commitment: &SubjectCommitment) -> bool {
        (self.approval.is_empty() || self.approval.contains(&commitment.other_approval_state))
            && (self.responses.is_empty() || self.responses.contains(&commitment.subject_response))
    }
}

/// Ordered severity table plus the chair escalation switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPolicy {
    pub rules: Vec<SeverityRule>,
    /// Raise a chair's conflicts one level (LOW→MEDIUM, MEDIUM→HIGH).
    pub escalate_chair: bool,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                SeverityRule {
                    approval: vec![ApprovalState::Confirmed],
                    responses: vec![SubjectResponse::Accepted],
                    severity: ConflictSeverity::High,
                },
                SeverityRule {
                    approval: vec![ApprovalState::Confirmed],
                    responses: vec![SubjectResponse::Pending, SubjectResponse::None],
                    severity: ConflictSeverity::Medium,
                },
                SeverityRule {
                    approval: vec![ApprovalState::Pending, ApprovalState::Draft],
                    responses: vec![],
                    severity: ConflictSeverity::Low,
                },
            ],
            escalate_chair: false,
        }
    }
}

impl SeverityPolicy {
    /// Severity of a commitment, or `None` when no rule matches.
    pub fn severity_of(&self, commitment: &SubjectCommitment) -> Option<ConflictSeverity> {
        let severity = self.rules.iter().find(|r| r.matches(commitment))?.severity;
        if self.escalate_chair && commitment.subject_role == SubjectRole::Chair {
            Some(severity.escalated())
        } else {
            Some(severity)
        }
    }
}

/// A commitment together with its assigned severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedConflict {
    pub commitment: SubjectCommitment,
    pub severity: ConflictSeverity,
}

/// Conflict counts per severity, summed over all subjects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeveritySummary {
    fn record(&mut self, severity: ConflictSeverity) {
        match severity {
            ConflictSeverity::High => self.high += 1,
            ConflictSeverity::Medium => self.medium += 1,
            ConflictSeverity::Low => self.low += 1,
        }
    }

    pub fn get(&self, severity: ConflictSeverity) -> usize {
        match severity {
            ConflictSeverity::High => self.high,
            ConflictSeverity::Medium => self.medium,
            ConflictSeverity::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Outcome of a classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictResult {
    /// Conflicts per subject, HIGH first, then by start time. Every subject
    /// passed in has an entry, possibly empty.
    pub subjects: BTreeMap<String, Vec<ClassifiedConflict>>,
    pub has_conflicts: bool,
    pub summary: SeveritySummary,
}

impl ConflictResult {
    pub fn conflicts_for(&self, subject_id: &str) -> &[ClassifiedConflict] {
        self.subjects
            .get(subject_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The most severe conflict found for any subject.
    pub fn worst_severity(&self) -> Option<ConflictSeverity> {
        self.subjects.values().flatten().map(|c| c.severity).max()
    }
}

/// Classify every subject's commitments against `candidate` with the default
/// [`SeverityPolicy`].
pub fn classify_participant_conflicts(
    candidate: &HalfOpenTimeInterval,
    per_subject: &BTreeMap<String, Vec<SubjectCommitment>>,
) -> ConflictResult {
    classify_participant_conflicts_with(candidate, per_subject, &SeverityPolicy::default())
}

/// Classify every subject's commitments against `candidate` with `policy`.
///
/// Commitments are expected to be pre-filtered to those overlapping the
/// candidate; any that do not overlap are dropped. Counts in the summary are
/// per subject, so one meeting shared by two subjects is counted twice.
pub fn classify_participant_conflicts_with(
    candidate: &HalfOpenTimeInterval,
    per_subject: &BTreeMap<String, Vec<SubjectCommitment>>,
    policy: &SeverityPolicy,
) -> ConflictResult {
    let mut result = ConflictResult::default();

    for (subject_id, commitments) in per_subject {
        let mut conflicts: Vec<ClassifiedConflict> = commitments
            .iter()
            .filter(|c| {
                let overlapping = candidate.overlaps(&c.interval);
                if !overlapping {
                    tracing::trace!(subject = %subject_id, "dropping non-overlapping commitment");
                }
                overlapping
            })
            .filter_map(|c| {
                policy.severity_of(c).map(|severity| ClassifiedConflict {
                    commitment: c.clone(),
                    severity,
                })
            })
            .collect();

        conflicts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.commitment.interval.start().cmp(&b.commitment.interval.start()))
        });

        for conflict in &conflicts {
            result.summary.record(conflict.severity);
        }
        result.has_conflicts |= !conflicts.is_empty();
        result.subjects.insert(subject_id.clone(), conflicts);
    }

    tracing::debug!(
        subjects = per_subject.len(),
        high = result.summary.high,
        medium = result.summary.medium,
        low = result.summary.low,
        "classified participant conflicts"
    );

    result
}
