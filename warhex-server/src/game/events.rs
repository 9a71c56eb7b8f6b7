//! Reports
//!
//! Append-only narrative log of everything the engine resolves. Every entry
//! carries a sequence number, the round and phase it was produced in, and an
//! optional visibility subject so the transport can redact it per viewer.

use serde::{Serialize, Deserialize};

use crate::game::phase::Phase;
use crate::game::state::TeamId;
use crate::game::unit::UnitId;

/// Report category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    /// Phase change
    Phase,
    /// Initiative rolls and order
    Initiative,
    /// Turn hand-over
    Turn,
    /// A turn is waiting on a skip command
    TurnSkippable,
    /// Unit movement
    Movement,
    /// Piloting skill roll
    Piloting,
    /// Attack roll
    Attack,
    /// Damage applied
    Damage,
    /// Critical hit
    Critical,
    /// Unit destroyed
    Destroyed,
    /// Crew damage and consciousness
    Crew,
    /// Heat effects
    Heat,
    /// Terrain change
    Terrain,
    /// Fire and smoke
    Fire,
    /// Building damage and collapse
    Building,
    /// Minefield placement and detonation
    Minefield,
    /// Artillery
    Artillery,
    /// Deployment
    Deployment,
    /// Game over
    Victory,
    /// Invalid declared action
    Error,
}

/// One report entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Position in the log (starts at 1)
    pub seq: u64,
    /// Round the entry was produced in
    pub round: u32,
    /// Phase the entry was produced in
    pub phase: Phase,
    /// Category
    pub kind: ReportKind,
    /// Unit whose visibility governs redaction
    pub subject: Option<UnitId>,
    /// Only this team may see the entry at all
    pub team_only: Option<TeamId>,
    /// Narrative text
    pub text: String,
}

impl Report {
    /// Copy with the narrative hidden.
    pub fn redacted(&self) -> Report {
        Report {
            subject: None,
            text: "********".to_string(),
            ..self.clone()
        }
    }
}

/// Ordered report log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLog {
    entries: Vec<Report>,
    next_seq: u64,
}

impl ReportLog {
    /// Empty log.
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_seq: 1 }
    }

    /// Append an entry, assigning its sequence number.
    pub fn push(&mut self, mut report: Report) -> u64 {
        if self.next_seq == 0 {
            self.next_seq = 1;
        }
        report.seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(report);
        self.next_seq - 1
    }

    /// All entries in order.
    pub fn entries(&self) -> &[Report] {
        &self.entries
    }

    /// Entries with a sequence number above `seq`.
    pub fn since(&self, seq: u64) -> &[Report] {
        let start = self.entries.partition_point(|r| r.seq <= seq);
        &self.entries[start..]
    }

    /// Entries of one kind.
    pub fn of_kind(&self, kind: ReportKind) -> impl Iterator<Item = &Report> {
        self.entries.iter().filter(move |r| r.kind == kind)
    }

    /// Sequence number of the newest entry (0 when empty).
    pub fn last_seq(&self) -> u64 {
        self.entries.last().map(|r| r.seq).unwrap_or(0)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: ReportKind, text: &str) -> Report {
        Report {
            seq: 0,
            round: 1,
            phase: Phase::Movement,
            kind,
            subject: Some(UnitId(3)),
            team_only: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_sequence_numbers() {
        let mut log = ReportLog::new();
        assert_eq!(log.push(entry(ReportKind::Movement, "a")), 1);
        assert_eq!(log.push(entry(ReportKind::Attack, "b")), 2);
        assert_eq!(log.push(entry(ReportKind::Movement, "c")), 3);
        assert_eq!(log.last_seq(), 3);
        assert_eq!(log.since(1).len(), 2);
        assert_eq!(log.since(3).len(), 0);
        assert_eq!(log.of_kind(ReportKind::Movement).count(), 2);
    }

    #[test]
    fn test_redaction_keeps_ordering_fields() {
        let mut log = ReportLog::new();
        log.push(entry(ReportKind::Damage, "Atlas takes 5 damage"));
        let original = &log.entries()[0];
        let hidden = original.redacted();
        assert_eq!(hidden.seq, original.seq);
        assert_eq!(hidden.kind, original.kind);
        assert!(hidden.subject.is_none());
        assert!(!hidden.text.contains("Atlas"));
    }
}
