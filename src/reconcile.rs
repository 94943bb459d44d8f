use std::collections::HashMap;
use std::fmt;

use crate::gviz::{Cell, RawTable, cell_at};

pub const UNNAMED: &str = "Unnamed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub total_score: i64,
}

impl Participant {
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for RoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundValue::Int(v) => write!(f, "{v}"),
            RoundValue::Text(s) => f.write_str(s),
        }
    }
}

pub type RoundSeries = Vec<RoundValue>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantModel {
    pub ranked: Vec<Participant>,
    pub rounds: HashMap<String, RoundSeries>,
    pub max_rounds: usize,
}

impl ParticipantModel {
    /// Round series for a display name; `None` means no round data.
    pub fn series_for(&self, name: &str) -> Option<&RoundSeries> {
        self.rounds.get(&normalize_name(name))
    }

    pub fn round_value(&self, name: &str, round: usize) -> Option<&RoundValue> {
        self.series_for(name).and_then(|series| series.get(round))
    }
}

/// Which rows of the rounds table are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSelection {
    AllNamed,
    FirstNamed(usize),
    /// Row indices `start..end`; unnamed rows inside the range are still skipped.
    Range { start: usize, end: usize },
}

/// Inclusive column bounds of the round window. Column 0 holds the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWindow {
    pub first: usize,
    pub last: usize,
}

impl ColumnWindow {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }
}

/// What an absent cell does to the rest of the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapPolicy {
    /// Skip the cell; later values shift left.
    Compact,
    /// End the series at the first absent cell.
    Truncate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundsLayout {
    pub rows: RowSelection,
    pub columns: ColumnWindow,
    pub gaps: GapPolicy,
}

impl Default for RoundsLayout {
    fn default() -> Self {
        Self {
            rows: RowSelection::AllNamed,
            columns: ColumnWindow::new(1, 30),
            gaps: GapPolicy::Compact,
        }
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn reconcile(totals: &RawTable, rounds: &RawTable) -> ParticipantModel {
    reconcile_with(totals, rounds, &RoundsLayout::default())
}

pub fn reconcile_with(
    totals: &RawTable,
    rounds: &RawTable,
    layout: &RoundsLayout,
) -> ParticipantModel {
    let ranked = rank_participants(totals);
    let rounds = parse_rounds(rounds, layout);
    let max_rounds = rounds.values().map(Vec::len).max().unwrap_or(0);
    ParticipantModel {
        ranked,
        rounds,
        max_rounds,
    }
}

/// Applies the degrade-to-default rules to one totals row: a blank name
/// becomes [`UNNAMED`], an unreadable score becomes 0.
pub fn participant_from_row(row: &[Cell]) -> Participant {
    let name = cell_at(row, 0)
        .text()
        .unwrap_or_else(|| UNNAMED.to_string());
    let total_score = cell_at(row, 1).parse_int().unwrap_or(0);
    Participant { name, total_score }
}

pub fn rank_participants(totals: &RawTable) -> Vec<Participant> {
    let mut ranked: Vec<Participant> = totals
        .rows
        .iter()
        .map(|row| participant_from_row(row))
        .collect();
    // sort_by is stable, ties keep sheet order
    ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    ranked
}

pub fn parse_rounds(table: &RawTable, layout: &RoundsLayout) -> HashMap<String, RoundSeries> {
    let named = table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| cell_at(row, 0).text().map(|name| (idx, name, row)));

    let selected: Vec<(String, &Vec<Cell>)> = match layout.rows {
        RowSelection::AllNamed => named.map(|(_, name, row)| (name, row)).collect(),
        RowSelection::FirstNamed(limit) => {
            named.take(limit).map(|(_, name, row)| (name, row)).collect()
        }
        RowSelection::Range { start, end } => named
            .filter(|(idx, _, _)| *idx >= start && *idx < end)
            .map(|(_, name, row)| (name, row))
            .collect(),
    };

    let mut out = HashMap::with_capacity(selected.len());
    for (name, row) in selected {
        out.insert(normalize_name(&name), series_from_row(row, layout));
    }
    out
}

fn series_from_row(row: &[Cell], layout: &RoundsLayout) -> RoundSeries {
    let ColumnWindow { first, last } = layout.columns;
    let mut series = Vec::new();
    if first > last {
        return series;
    }
    for col in first..=last.min(row.len().saturating_sub(1)) {
        let cell = &row[col];
        match round_value(cell) {
            Some(value) => series.push(value),
            None if layout.gaps == GapPolicy::Truncate => break,
            None => {}
        }
    }
    series
}

fn round_value(cell: &Cell) -> Option<RoundValue> {
    let text = cell.text()?;
    Some(match cell.parse_int() {
        Some(v) => RoundValue::Int(v),
        None => RoundValue::Text(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn participant_defaults_apply_to_blank_cells() {
        let p = participant_from_row(&[t("  "), t("n/a")]);
        assert_eq!(p.name, UNNAMED);
        assert_eq!(p.total_score, 0);

        let p = participant_from_row(&[]);
        assert_eq!(p.name, UNNAMED);
        assert_eq!(p.total_score, 0);

        let p = participant_from_row(&[t(" Ana "), Cell::Number(14.0)]);
        assert_eq!(p.name, "Ana");
        assert_eq!(p.total_score, 14);
    }

    #[test]
    fn series_on_short_row_stays_in_bounds() {
        let layout = RoundsLayout::default();
        assert!(series_from_row(&[t("solo")], &layout).is_empty());
        assert!(series_from_row(&[], &layout).is_empty());
    }

    #[test]
    fn inverted_window_reads_nothing() {
        let layout = RoundsLayout {
            columns: ColumnWindow::new(3, 1),
            ..RoundsLayout::default()
        };
        let row = vec![t("x"), Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0)];
        assert!(series_from_row(&row, &layout).is_empty());
    }

    #[test]
    fn round_value_keeps_non_numeric_text() {
        assert_eq!(round_value(&t(" DNF ")), Some(RoundValue::Text("DNF".into())));
        assert_eq!(round_value(&Cell::Number(3.0)), Some(RoundValue::Int(3)));
        assert_eq!(round_value(&t("")), None);
        assert_eq!(round_value(&Cell::Empty), None);
    }
}
