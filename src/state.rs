use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::DEFAULT_DISPLAY_LIMIT;
use crate::reconcile::{ParticipantModel, RoundValue};
use crate::rotation::{CursorPhase, RotationCursor};

pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(950);
const MAX_LOGS: usize = 200;

#[derive(Debug, Clone)]
pub enum Delta {
    SetModel(ParticipantModel),
    SourceUnavailable(String),
    Log(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCommand {
    RefreshNow,
    Shutdown,
}

/// The round shown for one participant in the current render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSlot {
    /// Zero-based round index.
    pub round: usize,
    pub value: Option<RoundValue>,
}

impl RoundSlot {
    pub fn label(&self) -> String {
        format!("M{}", self.round + 1)
    }
}

impl fmt::Display for RoundSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}: {value}", self.label()),
            None => write!(f, "{}: -", self.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRow {
    pub rank: usize,
    pub name: String,
    pub total: i64,
    pub round: Option<RoundSlot>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub model: ParticipantModel,
    pub cursor: RotationCursor,
    pub display_limit: usize,
    /// Last refresh failure; cleared by the next successful refresh.
    pub error: Option<String>,
    pub loaded: bool,
    pub updated_at: Option<String>,
    pub refreshes: u64,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    highlight_until: Option<Instant>,
    pending_render: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_LIMIT)
    }
}

impl AppState {
    pub fn new(display_limit: usize) -> Self {
        Self {
            model: ParticipantModel::default(),
            cursor: RotationCursor::new(),
            display_limit: display_limit.max(1),
            error: None,
            loaded: false,
            updated_at: None,
            refreshes: 0,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            highlight_until: None,
            pending_render: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn phase(&self) -> CursorPhase {
        self.cursor.phase(&self.model)
    }

    pub fn current_round(&self) -> Option<usize> {
        self.cursor.current_round(&self.model)
    }

    /// Fast-timer tick: move to the next round (only while there are rounds)
    /// and run a render pass.
    pub fn on_rotation_tick(&mut self, now: Instant) {
        if self.phase() == CursorPhase::Idle {
            return;
        }
        self.cursor.advance();
        self.render_pass(now);
    }

    /// Consumes the cursor's change latch once; a round change starts the
    /// highlight window.
    pub fn render_pass(&mut self, now: Instant) {
        self.pending_render = false;
        if self.cursor.did_change(&self.model) && self.current_round().is_some() {
            self.highlight_until = Some(now + HIGHLIGHT_DURATION);
        }
    }

    /// True once after a model swap that has not been rendered yet.
    pub fn take_pending_render(&mut self) -> bool {
        std::mem::take(&mut self.pending_render)
    }

    pub fn highlight_active(&self, now: Instant) -> bool {
        self.highlight_until.is_some_and(|until| now < until)
    }

    pub fn board_rows(&self) -> Vec<BoardRow> {
        let round = self.current_round();
        self.model
            .ranked
            .iter()
            .take(self.display_limit)
            .enumerate()
            .map(|(idx, participant)| BoardRow {
                rank: idx + 1,
                name: participant.name.clone(),
                total: participant.total_score,
                round: round.map(|round| RoundSlot {
                    round,
                    value: self
                        .model
                        .rounds
                        .get(&participant.key())
                        .and_then(|series| series.get(round))
                        .cloned(),
                }),
            })
            .collect()
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetModel(model) => {
            let max_rounds = model.max_rounds;
            let participants = model.ranked.len();
            state.model = model;
            state.cursor.reconcile_after_refresh(max_rounds);
            if state.error.take().is_some() {
                state.push_log("[INFO] Source recovered");
            }
            state.loaded = true;
            state.refreshes += 1;
            state.updated_at = Some(chrono::Local::now().format("%H:%M:%S").to_string());
            state.pending_render = true;
            state.push_log(format!(
                "[INFO] Leaderboard updated: {participants} participants, {max_rounds} rounds"
            ));
        }
        Delta::SourceUnavailable(message) => {
            state.push_log(format!("[WARN] Error loading data: {message}"));
            state.error = Some(message);
        }
        Delta::Log(message) => state.push_log(message),
    }
}
