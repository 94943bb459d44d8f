use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::config::Config;
use crate::gviz::{self, Cell, ParseError, RawTable};
use crate::http_client::http_client;

const SHEETS_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// A logical table: one sheet (tab) of a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub sheet_id: String,
    pub sheet_name: String,
}

impl TableRef {
    pub fn new(sheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }

    pub fn gviz_url(&self) -> Result<Url, SourceError> {
        let base = format!("{SHEETS_BASE_URL}/{}/gviz/tq", self.sheet_id);
        Url::parse_with_params(
            &base,
            &[("tqx", "out:json"), ("sheet", self.sheet_name.as_str())],
        )
        .map_err(|err| SourceError::Address {
            table: self.sheet_name.clone(),
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Parse,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Fetch => "fetch",
            ErrorKind::Parse => "parse",
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid address for `{table}`: {message}")]
    Address { table: String, message: String },
    #[error("request for `{table}` failed: {message}")]
    Transport { table: String, message: String },
    #[error("`{table}` responded with http {status}")]
    Status { table: String, status: u16 },
    #[error("`{table}`: {source}")]
    Parse {
        table: String,
        #[source]
        source: ParseError,
    },
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Address { .. }
            | SourceError::Transport { .. }
            | SourceError::Status { .. } => ErrorKind::Fetch,
            SourceError::Parse { .. } => ErrorKind::Parse,
        }
    }
}

pub trait TableSource: Send {
    fn fetch_table(&self, table: &TableRef) -> Result<RawTable, SourceError>;
}

/// Live Google Sheets source over the gviz endpoint.
#[derive(Debug, Default, Clone)]
pub struct SheetsSource;

impl TableSource for SheetsSource {
    fn fetch_table(&self, table: &TableRef) -> Result<RawTable, SourceError> {
        let url = table.gviz_url()?;
        let transport = |message: String| SourceError::Transport {
            table: table.sheet_name.clone(),
            message,
        };

        let client = http_client().map_err(|err| transport(format!("{err:#}")))?;
        let resp = client
            .get(url)
            .send()
            .map_err(|err| transport(err.to_string()))?;
        let status = resp.status();
        let body = resp.text().map_err(|err| transport(err.to_string()))?;
        decode_response(table, status, &body)
    }
}

/// Maps a finished HTTP exchange to a table: non-2xx is a fetch error,
/// anything else must be a framed gviz body.
pub fn decode_response(
    table: &TableRef,
    status: StatusCode,
    body: &str,
) -> Result<RawTable, SourceError> {
    if !status.is_success() {
        return Err(SourceError::Status {
            table: table.sheet_name.clone(),
            status: status.as_u16(),
        });
    }
    gviz::parse_gviz_response(body).map_err(|source| SourceError::Parse {
        table: table.sheet_name.clone(),
        source,
    })
}

/// Canned tables for offline runs. Sheets other than the configured totals
/// and rounds names come back empty.
#[derive(Debug, Clone)]
pub struct FakeSource {
    totals_sheet: String,
    rounds_sheet: String,
}

impl FakeSource {
    pub fn new(totals_sheet: impl Into<String>, rounds_sheet: impl Into<String>) -> Self {
        Self {
            totals_sheet: totals_sheet.into(),
            rounds_sheet: rounds_sheet.into(),
        }
    }
}

impl TableSource for FakeSource {
    fn fetch_table(&self, table: &TableRef) -> Result<RawTable, SourceError> {
        if table.sheet_name == self.totals_sheet {
            Ok(fake_totals())
        } else if table.sheet_name == self.rounds_sheet {
            Ok(fake_rounds())
        } else {
            Ok(RawTable::default())
        }
    }
}

pub fn source_from_config(config: &Config) -> Box<dyn TableSource> {
    if config.use_fake_source {
        Box::new(FakeSource::new(
            config.totals.sheet_name.clone(),
            config.rounds.sheet_name.clone(),
        ))
    } else {
        Box::new(SheetsSource)
    }
}

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn fake_totals() -> RawTable {
    let players: &[(&str, f64)] = &[
        ("Valkyrie", 41.0),
        ("Nox", 37.0),
        ("Pixel", 37.0),
        ("Ragnar", 29.0),
        ("Mika", 22.0),
        ("Toto", 18.0),
        ("Juno", 12.0),
        ("Zed", 5.0),
    ];
    RawTable::new(
        players
            .iter()
            .map(|(name, score)| vec![text(name), Cell::Number(*score)])
            .collect(),
    )
}

fn fake_rounds() -> RawTable {
    let rows: &[(&str, &[Option<f64>])] = &[
        ("valkyrie", &[Some(12.0), Some(9.0), Some(11.0), Some(9.0)]),
        ("Nox ", &[Some(8.0), Some(14.0), Some(7.0), Some(8.0)]),
        ("PIXEL", &[Some(10.0), None, Some(15.0), Some(12.0)]),
        ("Ragnar", &[Some(7.0), Some(6.0), Some(9.0), Some(7.0)]),
        ("Mika", &[Some(5.0), Some(6.0), Some(11.0)]),
        ("Toto", &[Some(9.0), Some(9.0)]),
        ("Juno", &[Some(4.0), Some(8.0)]),
    ];
    RawTable::new(
        rows.iter()
            .map(|(name, rounds)| {
                std::iter::once(text(name))
                    .chain(rounds.iter().map(|v| v.map(Cell::Number).unwrap_or(Cell::Empty)))
                    .collect()
            })
            .collect(),
    )
}
