//! Event sinks: ordered, append-only destinations for occupancy events.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;

use crate::error::SinkError;
use crate::tracker::{EventKind, OccupancyEvent};

/// Timestamp format used in exported ledgers.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ordered destination for occupancy events.
///
/// Implementations must preserve append order. Errors are fatal to the run:
/// the audit trail may not silently lose events.
pub trait EventSink {
    fn append(&mut self, event: &OccupancyEvent) -> Result<(), SinkError>;

    /// Persist anything buffered. Called when a run stops.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub events: Vec<OccupancyEvent>,
    pub flushes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for MemorySink {
    fn append(&mut self, event: &OccupancyEvent) -> Result<(), SinkError> {
        self.events.push(event.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.flushes += 1;
        Ok(())
    }
}

/// One stay in the zone: opened at Entry, completed at the matching Exit.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub track_id: u64,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
}

impl LedgerRow {
    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }
}

#[derive(Serialize)]
struct CsvRow {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(rename = "Entrada")]
    entered: String,
    #[serde(rename = "Saída")]
    exited: Option<String>,
}

/// Entry/exit ledger in the `ID, Entrada, Saída` layout.
#[derive(Debug, Default, Clone)]
pub struct OccupancyLedger {
    rows: Vec<LedgerRow>,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Rows still waiting for their Exit.
    pub fn open_rows(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows.iter().filter(|r| r.is_open())
    }

    pub fn record(&mut self, event: &OccupancyEvent) {
        match event.kind {
            EventKind::Entry => self.rows.push(LedgerRow {
                track_id: event.track_id,
                entered_at: event.timestamp,
                exited_at: None,
            }),
            EventKind::Exit => {
                let open = self
                    .rows
                    .iter_mut()
                    .rev()
                    .find(|r| r.track_id == event.track_id && r.is_open());
                match open {
                    Some(row) => row.exited_at = Some(event.timestamp),
                    None => warn!("exit for track {} without an open entry", event.track_id),
                }
            }
        }
    }

    /// Write the ledger as CSV with a header row. Open stays have an empty
    /// `Saída` column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), SinkError> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv.serialize(CsvRow {
                id: row.track_id,
                entered: row.entered_at.format(TIMESTAMP_FORMAT).to_string(),
                exited: row
                    .exited_at
                    .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            })?;
        }
        if self.rows.is_empty() {
            csv.write_record(["ID", "Entrada", "Saída"])?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl EventSink for OccupancyLedger {
    fn append(&mut self, event: &OccupancyEvent) -> Result<(), SinkError> {
        self.record(event);
        Ok(())
    }
}

/// Ledger that rewrites a CSV file on every flush.
#[derive(Debug)]
pub struct CsvLedgerSink {
    path: PathBuf,
    ledger: OccupancyLedger,
}

impl CsvLedgerSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ledger: OccupancyLedger::new(),
        }
    }

    pub fn ledger(&self) -> &OccupancyLedger {
        &self.ledger
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for CsvLedgerSink {
    fn append(&mut self, event: &OccupancyEvent) -> Result<(), SinkError> {
        self.ledger.record(event);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        let file = File::create(&self.path)?;
        self.ledger.write_csv(BufWriter::new(file))
    }
}

/// Writes each event immediately as one JSON line.
#[derive(Debug)]
pub struct JsonEventLog<W: Write> {
    writer: W,
}

impl<W: Write> JsonEventLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonEventLog<W> {
    fn append(&mut self, event: &OccupancyEvent) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, secs).unwrap()
    }

    #[test]
    fn test_ledger_pairs_entries_and_exits() {
        let mut ledger = OccupancyLedger::new();
        ledger.record(&OccupancyEvent::entry(1, 3, at(1)));
        ledger.record(&OccupancyEvent::entry(2, 3, at(1)));
        ledger.record(&OccupancyEvent::exit(1, 5, at(9)));
        ledger.record(&OccupancyEvent::entry(1, 7, at(20)));

        let rows = ledger.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].exited_at, Some(at(9)));
        assert!(rows[1].is_open());
        assert!(rows[2].is_open());
        assert_eq!(ledger.open_rows().count(), 2);
    }

    #[test]
    fn test_unmatched_exit_is_ignored() {
        let mut ledger = OccupancyLedger::new();
        ledger.record(&OccupancyEvent::exit(4, 1, at(0)));
        assert!(ledger.rows().is_empty());
    }

    #[test]
    fn test_csv_layout() {
        let mut ledger = OccupancyLedger::new();
        ledger.record(&OccupancyEvent::entry(7, 3, at(5)));
        ledger.record(&OccupancyEvent::exit(7, 5, at(42)));
        ledger.record(&OccupancyEvent::entry(8, 6, at(50)));

        let mut out = Vec::new();
        ledger.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "ID,Entrada,Saída\n7,2024-05-01 08:00:05,2024-05-01 08:00:42\n8,2024-05-01 08:00:50,\n"
        );
    }

    #[test]
    fn test_csv_sink_rewrites_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut sink = CsvLedgerSink::new(&path);
        sink.append(&OccupancyEvent::entry(1, 1, at(0))).unwrap();
        sink.flush().unwrap();
        sink.append(&OccupancyEvent::exit(1, 2, at(3))).unwrap();
        sink.flush().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("2024-05-01 08:00:03\n"));
    }

    #[test]
    fn test_csv_sink_surfaces_write_failure() {
        let mut sink = CsvLedgerSink::new("/nonexistent-dir/ledger.csv");
        sink.append(&OccupancyEvent::entry(1, 1, at(0))).unwrap();
        assert!(matches!(sink.flush(), Err(SinkError::Io(_))));
    }

    #[test]
    fn test_json_event_log() {
        let mut log = JsonEventLog::new(Vec::new());
        log.append(&OccupancyEvent::entry(1, 1, at(0))).unwrap();
        log.append(&OccupancyEvent::exit(1, 2, at(1))).unwrap();
        let text = String::from_utf8(log.into_inner()).unwrap();
        let kinds: Vec<&str> = text
            .lines()
            .map(|l| if l.contains("\"Entry\"") { "entry" } else { "exit" })
            .collect();
        assert_eq!(kinds, vec!["entry", "exit"]);
    }
}
