use std::env;
use std::time::Duration;

use crate::reconcile::{ColumnWindow, GapPolicy, RoundsLayout, RowSelection};
use crate::source::TableRef;

pub const DEFAULT_SHEET_ID: &str = "1K1i2yCRTwXyU_CnqZz9QvP8ykzXDB-ZNRibvEmjmLQs";
pub const DEFAULT_TOTALS_SHEET: &str = "Sheet1";
pub const DEFAULT_ROUNDS_SHEET: &str = "Sheet2";
pub const DEFAULT_ROTATE_SECS: u64 = 5;
pub const DEFAULT_REFRESH_SECS: u64 = 30;
pub const DEFAULT_DISPLAY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub totals: TableRef,
    pub rounds: TableRef,
    pub use_fake_source: bool,
    /// Rotation interval (fast timer).
    pub fast_cadence: Duration,
    /// Full refresh interval (slow timer).
    pub slow_cadence: Duration,
    pub display_limit: usize,
    pub layout: RoundsLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key).and_then(|val| {
                let trimmed = val.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        let sheet_id = get("LEADERBOARD_SHEET_ID").unwrap_or_else(|| DEFAULT_SHEET_ID.to_string());
        let totals_sheet =
            get("LEADERBOARD_TOTALS_SHEET").unwrap_or_else(|| DEFAULT_TOTALS_SHEET.to_string());
        let rounds_sheet =
            get("LEADERBOARD_ROUNDS_SHEET").unwrap_or_else(|| DEFAULT_ROUNDS_SHEET.to_string());
        let use_fake_source = get("LEADERBOARD_SOURCE")
            .map(|val| val.eq_ignore_ascii_case("fake"))
            .unwrap_or(false);

        let rotate_secs = get("ROTATE_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_ROTATE_SECS)
            .max(1);
        let refresh_secs = get("REFRESH_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_SECS)
            .max(5);
        let display_limit = get("DISPLAY_LIMIT")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_DISPLAY_LIMIT)
            .clamp(1, 100);

        let defaults = RoundsLayout::default();
        let first_col = get("ROUNDS_FIRST_COL")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.columns.first)
            .max(1);
        let last_col = get("ROUNDS_LAST_COL")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(defaults.columns.last);

        let rows = get("ROUNDS_ROW_RANGE")
            .and_then(|val| parse_row_range(&val))
            .or_else(|| {
                get("ROUNDS_ROW_LIMIT")
                    .and_then(|val| val.parse::<usize>().ok())
                    .map(RowSelection::FirstNamed)
            })
            .unwrap_or(defaults.rows);

        let gaps = match get("ROUNDS_GAP_POLICY").map(|val| val.to_lowercase()) {
            Some(val) if val == "truncate" => GapPolicy::Truncate,
            _ => GapPolicy::Compact,
        };

        Self {
            totals: TableRef::new(sheet_id.clone(), totals_sheet),
            rounds: TableRef::new(sheet_id, rounds_sheet),
            use_fake_source,
            fast_cadence: Duration::from_secs(rotate_secs),
            slow_cadence: Duration::from_secs(refresh_secs),
            display_limit,
            layout: RoundsLayout {
                rows,
                columns: ColumnWindow::new(first_col, last_col),
                gaps,
            },
        }
    }
}

/// `"2-5"` selects row indices 2 through 5 inclusive.
fn parse_row_range(raw: &str) -> Option<RowSelection> {
    let (start, end) = raw.split_once('-')?;
    let start = start.trim().parse::<usize>().ok()?;
    let end = end.trim().parse::<usize>().ok()?;
    if end < start {
        return None;
    }
    Some(RowSelection::Range {
        start,
        end: end.checked_add(1)?,
    })
}
