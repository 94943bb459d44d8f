use crate::reconcile::ParticipantModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    /// No round data; nothing to rotate.
    Idle,
    Rotating,
}

/// Monotonic index into the rounds, reduced modulo the current round count.
///
/// The index survives model swaps; only [`RotationCursor::reconcile_after_refresh`]
/// folds it back into range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationCursor {
    index: usize,
    last_displayed: Option<usize>,
}

impl RotationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(index: usize) -> Self {
        Self {
            index,
            last_displayed: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn last_displayed(&self) -> Option<usize> {
        self.last_displayed
    }

    pub fn advance(&mut self) {
        self.index = self.index.wrapping_add(1);
    }

    pub fn current_round(&self, model: &ParticipantModel) -> Option<usize> {
        round_for(self.index, model.max_rounds)
    }

    pub fn phase(&self, model: &ParticipantModel) -> CursorPhase {
        if model.max_rounds > 0 {
            CursorPhase::Rotating
        } else {
            CursorPhase::Idle
        }
    }

    pub fn reconcile_after_refresh(&mut self, new_max_rounds: usize) {
        if new_max_rounds > 0 {
            self.index %= new_max_rounds;
        }
    }

    /// Single-consumer latch: reports whether the displayed round differs from
    /// the previous render pass and records the current one. Call exactly once
    /// per render.
    pub fn did_change(&mut self, model: &ParticipantModel) -> bool {
        let current = self.current_round(model);
        let changed = current != self.last_displayed;
        self.last_displayed = current;
        changed
    }
}

fn round_for(index: usize, max_rounds: usize) -> Option<usize> {
    if max_rounds == 0 {
        None
    } else {
        Some(index % max_rounds)
    }
}
