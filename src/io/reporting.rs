// src/io/reporting.rs

use crate::error::ReportError;
use crate::simulation::config::SimulationConfig;
use crate::simulation::driver::{GameSummary, HistoryRecord};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the game history to a CSV file, one row per node per turn.
///
/// # Arguments
/// * `path` - Where to save the file (e.g., "results/run_1.csv").
/// * `records` - The history collected by the game driver.
pub fn write_history_csv(path: impl AsRef<Path>, records: &[HistoryRecord]) -> Result<(), ReportError> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    for record in records {
        writer.serialize(record)?;
    }

    // Flush the buffer to ensure all data is written
    writer.flush()?;

    info!(rows = records.len(), path = %path.display(), "History exported");
    Ok(())
}

/// The single scalar a finished game is judged by, with enough context to
/// tell runs apart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub player: String,
    pub score: f64,
    pub turns: usize,
    pub seed: u64,
}

impl ScoreRecord {
    pub fn new(player: impl Into<String>, summary: &GameSummary, config: &SimulationConfig) -> Self {
        Self {
            player: player.into(),
            score: summary.total_cost,
            turns: summary.turns,
            seed: config.seed,
        }
    }
}

/// Destination for final scores. Only ever called after the game is done,
/// so the simulation never depends on it being reachable.
pub trait ScoreSink {
    fn submit(&mut self, record: &ScoreRecord) -> Result<(), ReportError>;
}

/// Prints the score to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ScoreSink for ConsoleSink {
    fn submit(&mut self, record: &ScoreRecord) -> Result<(), ReportError> {
        println!(
            "Score for {}: {:.2} over {} turns (seed {})",
            record.player, record.score, record.turns, record.seed
        );
        Ok(())
    }
}

/// Appends one JSON object per line to a ledger file.
#[derive(Debug, Clone)]
pub struct JsonLinesLedger {
    path: PathBuf,
}

impl JsonLinesLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreSink for JsonLinesLedger {
    fn submit(&mut self, record: &ScoreRecord) -> Result<(), ReportError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;

        info!(path = %self.path.display(), score = record.score, "Score submitted");
        Ok(())
    }
}
