use crate::recorder::{RoundSummary, SelectionRecord};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TIME_FORMAT: &str = "%H:%M:%S%.6f";
const DATE_FORMAT: &str = "%Y-%m-%d";

const SUMMARY_HEADER: [&str; 8] = [
    "round",
    "shape_number",
    "player_id",
    "score",
    "attempts",
    "start_time",
    "end_time",
    "date",
];

const SELECTION_HEADER: [&str; 7] = [
    "round",
    "choice",
    "position",
    "hit",
    "search_start",
    "dwell_start",
    "dwell_end",
];

/// A sink rejected a write. Reported, never retried.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("csv error writing {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("sink rejected write: {0}")]
    Rejected(String),
}

/// Append-only destination for the two record streams.
///
/// `header` is true for the first write of a session.
pub trait PersistenceSink {
    fn append_selections(&mut self, rows: &[SelectionRecord], header: bool) -> Result<(), PersistError>;
    fn append_summary(&mut self, row: &RoundSummary, header: bool) -> Result<(), PersistError>;
}

fn time_of_day(t: &DateTime<Local>) -> String {
    t.format(TIME_FORMAT).to_string()
}

#[derive(Serialize)]
struct SummaryRow {
    round: u32,
    shape_number: usize,
    player_id: u32,
    score: u32,
    attempts: u32,
    start_time: String,
    end_time: String,
    date: String,
}

impl From<&RoundSummary> for SummaryRow {
    fn from(s: &RoundSummary) -> Self {
        Self {
            round: s.round,
            shape_number: s.shape_index,
            player_id: s.player_id,
            score: s.score,
            attempts: s.attempts,
            start_time: time_of_day(&s.started_at),
            end_time: time_of_day(&s.ended_at),
            date: s.date.format(DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Serialize)]
struct SelectionRow {
    round: u32,
    choice: u32,
    position: String,
    hit: bool,
    search_start: String,
    dwell_start: String,
    dwell_end: String,
}

impl From<&SelectionRecord> for SelectionRow {
    fn from(r: &SelectionRecord) -> Self {
        Self {
            round: r.round,
            choice: r.choice,
            position: r.position.to_string(),
            hit: r.correct,
            search_start: time_of_day(&r.search_start),
            dwell_start: time_of_day(&r.dwell_start),
            dwell_end: time_of_day(&r.dwell_end),
        }
    }
}

/// Writes `<id>.csv` (round summaries) and `<id>_choices.csv` (selections)
/// into a player's folder.
#[derive(Debug, Clone)]
pub struct CsvSink {
    summary_path: PathBuf,
    choices_path: PathBuf,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(dir: P, player_id: u32) -> Self {
        let dir = dir.as_ref();
        Self {
            summary_path: dir.join(format!("{player_id}.csv")),
            choices_path: dir.join(format!("{player_id}_choices.csv")),
        }
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }

    pub fn choices_path(&self) -> &Path {
        &self.choices_path
    }

    fn append<S: Serialize>(path: &Path, header: Option<&[&str]>, rows: &[S]) -> Result<(), PersistError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| PersistError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let csv_err = |source: csv::Error| PersistError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if let Some(header) = header {
            writer.write_record(header).map_err(csv_err)?;
        }
        for row in rows {
            writer.serialize(row).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl PersistenceSink for CsvSink {
    fn append_selections(&mut self, rows: &[SelectionRecord], header: bool) -> Result<(), PersistError> {
        let rows: Vec<SelectionRow> = rows.iter().map(SelectionRow::from).collect();
        Self::append(&self.choices_path, header.then_some(&SELECTION_HEADER[..]), &rows)
    }

    fn append_summary(&mut self, row: &RoundSummary, header: bool) -> Result<(), PersistError> {
        Self::append(
            &self.summary_path,
            header.then_some(&SUMMARY_HEADER[..]),
            &[SummaryRow::from(row)],
        )
    }
}

/// In-memory sink for tests. Can be switched to reject writes.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub selections: Vec<SelectionRecord>,
    pub summaries: Vec<RoundSummary>,
    /// Header flag of every write, in order
    pub headers: Vec<bool>,
    pub fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl PersistenceSink for MemorySink {
    fn append_selections(&mut self, rows: &[SelectionRecord], header: bool) -> Result<(), PersistError> {
        if self.fail {
            return Err(PersistError::Rejected("selections".into()));
        }
        self.headers.push(header);
        self.selections.extend_from_slice(rows);
        Ok(())
    }

    fn append_summary(&mut self, row: &RoundSummary, header: bool) -> Result<(), PersistError> {
        if self.fail {
            return Err(PersistError::Rejected("summary".into()));
        }
        self.headers.push(header);
        self.summaries.push(row.clone());
        Ok(())
    }
}
