//! Google Visualization ("gviz") response decoding.
//!
//! The sheets endpoint wraps its JSON payload in a JavaScript callback:
//! a fixed 47-character preamble and a two-character `);` suffix. Both are
//! stripped before the payload is decoded into a [`RawTable`].

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const GVIZ_PREFIX_LEN: usize = 47;
pub const GVIZ_SUFFIX: &str = ");";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response framing mismatch: {0}")]
    Framing(String),
    #[error("invalid gviz json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("query failed upstream: {0}")]
    Upstream(String),
    #[error("unexpected gviz structure: {0}")]
    Structure(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Trimmed string form, `None` when the cell carries nothing visible.
    pub fn text(&self) -> Option<String> {
        let raw = match self {
            Cell::Empty => return None,
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
        };
        if raw.is_empty() { None } else { Some(raw) }
    }

    /// Base-10 integer reading of the cell: numbers truncate toward zero,
    /// strings use their leading (optionally signed) digit run.
    pub fn parse_int(&self) -> Option<i64> {
        match self {
            Cell::Empty | Cell::Bool(_) => None,
            Cell::Number(n) => {
                if n.is_finite() {
                    Some(n.trunc() as i64)
                } else {
                    None
                }
            }
            Cell::Text(s) => parse_leading_int(s),
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::String(s) => Cell::Text(s),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::Bool(b) => Cell::Bool(b),
            other => Cell::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn cell_at(row: &[Cell], col: usize) -> &Cell {
    static EMPTY: Cell = Cell::Empty;
    row.get(col).unwrap_or(&EMPTY)
}

#[derive(Debug, Deserialize)]
struct GvizResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<GvizIssue>,
    #[serde(default)]
    table: Option<GvizTable>,
}

#[derive(Debug, Deserialize)]
struct GvizIssue {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detailed_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GvizTable {
    #[serde(default)]
    rows: Option<Vec<GvizRow>>,
}

#[derive(Debug, Deserialize)]
struct GvizRow {
    #[serde(default)]
    c: Vec<Option<GvizCell>>,
}

#[derive(Debug, Deserialize)]
struct GvizCell {
    #[serde(default)]
    v: Value,
}

pub fn strip_gviz_framing(raw: &str) -> Result<&str, ParseError> {
    let min_len = GVIZ_PREFIX_LEN + GVIZ_SUFFIX.len();
    if raw.len() < min_len {
        return Err(ParseError::Framing(format!(
            "body is {} bytes, expected at least {min_len}",
            raw.len()
        )));
    }
    if !raw.ends_with(GVIZ_SUFFIX) {
        return Err(ParseError::Framing(format!(
            "body does not end with `{GVIZ_SUFFIX}`"
        )));
    }
    raw.get(GVIZ_PREFIX_LEN..raw.len() - GVIZ_SUFFIX.len())
        .ok_or_else(|| ParseError::Framing("preamble does not end on a character boundary".into()))
}

pub fn parse_gviz_response(raw: &str) -> Result<RawTable, ParseError> {
    let payload = strip_gviz_framing(raw)?;
    parse_gviz_payload(payload)
}

pub fn parse_gviz_payload(payload: &str) -> Result<RawTable, ParseError> {
    let response: GvizResponse = serde_json::from_str(payload)?;

    if response.status.as_deref() == Some("error") {
        let message = response
            .errors
            .into_iter()
            .next()
            .and_then(|issue| issue.detailed_message.or(issue.message).or(issue.reason))
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(ParseError::Upstream(message));
    }

    let rows = response
        .table
        .ok_or_else(|| ParseError::Structure("missing `table`".into()))?
        .rows
        .ok_or_else(|| ParseError::Structure("missing `table.rows`".into()))?;

    let rows = rows
        .into_iter()
        .map(|row| {
            row.c
                .into_iter()
                .map(|cell| cell.map(|c| Cell::from(c.v)).unwrap_or(Cell::Empty))
                .collect()
        })
        .collect();

    Ok(RawTable { rows })
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => ("-", &s[1..]),
        Some(b'+') => ("", &s[1..]),
        _ => ("", s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    format!("{sign}{}", &digits[..end]).parse::<i64>().ok()
}
