use crate::board::Selection;
use crate::clock::WallAnchor;
use crate::geometry::Position;
use chrono::{DateTime, Local, NaiveDate};
use std::time::Instant;

/// One completed dwell selection. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRecord {
    pub round: u32,
    /// 1-based, cumulative within the round
    pub choice: u32,
    pub position: Position,
    pub correct: bool,
    /// When the board became selectable for this choice
    pub search_start: DateTime<Local>,
    pub dwell_start: DateTime<Local>,
    pub dwell_end: DateTime<Local>,
}

/// One row per completed (or forcibly ended) round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub shape_index: usize,
    pub player_id: u32,
    pub score: u32,
    pub attempts: u32,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    pub date: NaiveDate,
}

/// Accumulates the selection log of the current round and the summaries of
/// every round closed this session.
#[derive(Debug)]
pub struct TrialRecorder {
    anchor: WallAnchor,
    pending: Vec<SelectionRecord>,
    summaries: Vec<RoundSummary>,
}

impl TrialRecorder {
    pub fn new(anchor: WallAnchor) -> Self {
        Self {
            anchor,
            pending: Vec::new(),
            summaries: Vec::new(),
        }
    }

    pub fn wall_time(&self, at: Instant) -> DateTime<Local> {
        self.anchor.wall_time(at)
    }

    pub fn record(
        &mut self,
        round: u32,
        choice: u32,
        selection: &Selection,
        search_start: Instant,
    ) {
        let record = SelectionRecord {
            round,
            choice,
            position: selection.position,
            correct: selection.correct,
            search_start: self.wall_time(search_start),
            dwell_start: self.wall_time(selection.dwell_start),
            dwell_end: self.wall_time(selection.dwell_end),
        };
        tracing::debug!(
            round,
            choice,
            position = %record.position,
            correct = record.correct,
            "selection recorded"
        );
        self.pending.push(record);
    }

    /// Selections of the round in progress
    pub fn pending(&self) -> &[SelectionRecord] {
        &self.pending
    }

    /// Closes the round: stores its summary and hands back its selections.
    pub fn close_round(&mut self, summary: RoundSummary) -> Vec<SelectionRecord> {
        self.summaries.push(summary);
        std::mem::take(&mut self.pending)
    }

    pub fn summaries(&self) -> &[RoundSummary] {
        &self.summaries
    }
}
