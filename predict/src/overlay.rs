use state::{Cell, TerminalState};

use crate::adaptive::AdaptiveActivation;
use crate::mode::PredictionMode;

/// Cap on predicted cells per row, and globally — the oldest is dropped
/// first once either is exceeded (§5 resource policy).
const PER_ROW_CELL_CAP: usize = 16;
const GLOBAL_CELL_CAP: usize = 40;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PredictionTarget {
    Cell { row: usize, col: usize, glyph: char, original: Cell },
    Cursor { row: usize, col: usize },
}

/// One speculative edit, tagged with the epoch it was created in so a
/// wrong reconciliation can bulk-invalidate everything from that epoch
/// (§4.6, GLOSSARY "Epoch (prediction)").
#[derive(Copy, Clone, Debug)]
pub struct Prediction {
    pub target: PredictionTarget,
    created_epoch: u64,
    prediction_time_ms: u64,
    expiration_time_ms: u64,
    tentative_until_time_ms: u64,
}

impl Prediction {
    pub fn is_visible(&self, now_ms: u64) -> bool {
        now_ms >= self.tentative_until_time_ms
    }

    fn matches(&self, server: &TerminalState) -> bool {
        match self.target {
            PredictionTarget::Cell { row, col, glyph, .. } => server.get(row, col).ch == glyph,
            PredictionTarget::Cursor { row, col } => server.cursor() == (row, col),
        }
    }

    fn row(&self) -> Option<usize> {
        match self.target {
            PredictionTarget::Cell { row, .. } => Some(row),
            PredictionTarget::Cursor { .. } => None,
        }
    }

    fn is_cell(&self) -> bool {
        matches!(self.target, PredictionTarget::Cell { .. })
    }
}

/// The client's speculation layer: a set of predictions overlaid on top of
/// the authoritative `TerminalState` (§4.6). Never mutates the server
/// state it's given; `render` always composes a fresh copy.
pub struct PredictionEngine {
    mode: PredictionMode,
    adaptive: AdaptiveActivation,
    epoch: u64,
    predictions: Vec<Prediction>,
    cursor_hint: Option<(usize, usize)>,
}

impl PredictionEngine {
    pub fn new(mode: PredictionMode) -> Self {
        PredictionEngine { mode, adaptive: AdaptiveActivation::new(), epoch: 0, predictions: Vec::new(), cursor_hint: None }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    fn should_render(&self) -> bool {
        match self.mode {
            PredictionMode::Never => false,
            PredictionMode::Always => true,
            PredictionMode::Adaptive => self.adaptive.is_active(),
        }
    }

    /// Hypothesize the effect of one keystroke byte on the local display
    /// (§4.6 "On local keystroke"). `grace_period_ms` and
    /// `expiration_window_ms` are typically derived from the current SRTT
    /// estimate by the caller.
    pub fn predict_keystroke(&mut self, now_ms: u64, byte: u8, server: &TerminalState, grace_period_ms: u64, expiration_window_ms: u64) {
        if !(0x20..=0x7e).contains(&byte) {
            self.flush();
            return;
        }

        let (rows, cols) = server.dimensions();
        let (mut row, mut col) = self.cursor_hint.unwrap_or_else(|| server.cursor());
        if row >= rows {
            return;
        }

        let original = server.get(row, col);
        let glyph = byte as char;
        self.push_cell_prediction(now_ms, row, col, glyph, original, grace_period_ms, expiration_window_ms);

        col += 1;
        if col >= cols {
            col = 0;
            row += 1;
        }
        self.cursor_hint = Some((row, col));
        if row < rows {
            self.push_cursor_prediction(now_ms, row, col, grace_period_ms, expiration_window_ms);
        }
    }

    /// Control sequences (including CR/LF) are not predicted; they discard
    /// whatever speculation is in flight (§4.6).
    pub fn flush(&mut self) {
        self.predictions.clear();
        self.cursor_hint = None;
    }

    fn push_cell_prediction(&mut self, now_ms: u64, row: usize, col: usize, glyph: char, original: Cell, grace_period_ms: u64, expiration_window_ms: u64) {
        self.predictions.retain(|p| !matches!(p.target, PredictionTarget::Cell { row: r, col: c, .. } if r == row && c == col));

        let row_count = self.predictions.iter().filter(|p| p.row() == Some(row)).count();
        if row_count >= PER_ROW_CELL_CAP {
            self.drop_oldest(|p| p.row() == Some(row));
        }
        if self.predictions.iter().filter(|p| p.is_cell()).count() >= GLOBAL_CELL_CAP {
            self.drop_oldest(|p| p.is_cell());
        }

        self.predictions.push(Prediction {
            target: PredictionTarget::Cell { row, col, glyph, original },
            created_epoch: self.epoch,
            prediction_time_ms: now_ms,
            tentative_until_time_ms: now_ms + grace_period_ms,
            expiration_time_ms: now_ms + expiration_window_ms,
        });
    }

    fn push_cursor_prediction(&mut self, now_ms: u64, row: usize, col: usize, grace_period_ms: u64, expiration_window_ms: u64) {
        self.predictions.retain(|p| !matches!(p.target, PredictionTarget::Cursor { .. }));
        self.predictions.push(Prediction {
            target: PredictionTarget::Cursor { row, col },
            created_epoch: self.epoch,
            prediction_time_ms: now_ms,
            tentative_until_time_ms: now_ms + grace_period_ms,
            expiration_time_ms: now_ms + expiration_window_ms,
        });
    }

    fn drop_oldest(&mut self, filter: impl Fn(&Prediction) -> bool) {
        if let Some(index) = self
            .predictions
            .iter()
            .enumerate()
            .filter(|(_, p)| filter(p))
            .min_by_key(|(_, p)| p.prediction_time_ms)
            .map(|(i, _)| i)
        {
            self.predictions.remove(index);
        }
    }

    /// Reconcile predictions created in the current epoch against the
    /// latest authoritative state. `server_time_ms` is the wall time the
    /// server state itself was recorded at (§4.6 "Reconciliation").
    pub fn reconcile(&mut self, now_ms: u64, server_time_ms: u64, server: &TerminalState) {
        let epoch = self.epoch;
        let due: Vec<&Prediction> = self.predictions.iter().filter(|p| p.created_epoch == epoch && server_time_ms >= p.prediction_time_ms).collect();
        let any_wrong = due.iter().any(|p| !p.matches(server) || now_ms > p.expiration_time_ms);

        if any_wrong {
            for prediction in &due {
                let latency = now_ms.saturating_sub(prediction.prediction_time_ms) as f64;
                self.adaptive.record_outcome(latency, false);
            }
            self.predictions.retain(|p| p.created_epoch != epoch);
            self.epoch += 1;
        } else {
            let resolved_times: Vec<u64> = due.iter().map(|p| p.prediction_time_ms).collect();
            for prediction_time_ms in &resolved_times {
                let latency = now_ms.saturating_sub(*prediction_time_ms) as f64;
                self.adaptive.record_outcome(latency, true);
            }
            self.predictions
                .retain(|p| !(p.created_epoch == epoch && server_time_ms >= p.prediction_time_ms));
        }
    }

    /// Compose `server_state ⊕ overlay`: a fresh `TerminalState` with every
    /// currently-visible prediction applied on top. `server` itself is
    /// never mutated (§4.6 "Display contract").
    pub fn render(&self, now_ms: u64, server: &TerminalState) -> TerminalState {
        let mut display = server.clone();
        if !self.should_render() {
            return display;
        }
        for prediction in &self.predictions {
            if !prediction.is_visible(now_ms) {
                continue;
            }
            match prediction.target {
                PredictionTarget::Cell { row, col, glyph, .. } => display.set(row, col, Cell { ch: glyph }),
                PredictionTarget::Cursor { row, col } => display.move_cursor(row, col),
            }
        }
        display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(rows: usize, cols: usize) -> TerminalState {
        TerminalState::new(rows, cols)
    }

    #[test]
    fn a_fresh_prediction_is_invisible_during_its_grace_period() {
        let mut engine = PredictionEngine::new(PredictionMode::Always);
        let srv = server(3, 10);
        engine.predict_keystroke(1000, b'a', &srv, 75, 2000);

        let rendered_during_grace = engine.render(1010, &srv);
        assert_eq!(rendered_during_grace.get(0, 0).ch, ' ');

        let rendered_after_grace = engine.render(1080, &srv);
        assert_eq!(rendered_after_grace.get(0, 0).ch, 'a');
    }

    #[test]
    fn never_mode_renders_nothing_even_when_visible() {
        let mut engine = PredictionEngine::new(PredictionMode::Never);
        let srv = server(3, 10);
        engine.predict_keystroke(1000, b'a', &srv, 0, 2000);
        let rendered = engine.render(2000, &srv);
        assert_eq!(rendered.get(0, 0).ch, ' ');
    }

    #[test]
    fn render_never_mutates_the_server_state_it_was_given() {
        let mut engine = PredictionEngine::new(PredictionMode::Always);
        let srv = server(3, 10);
        engine.predict_keystroke(1000, b'a', &srv, 0, 2000);
        let _ = engine.render(2000, &srv);
        assert_eq!(srv.get(0, 0).ch, ' ');
    }

    #[test]
    fn correct_confirmation_removes_the_prediction() {
        let mut engine = PredictionEngine::new(PredictionMode::Always);
        let srv = server(3, 10);
        engine.predict_keystroke(1000, b'a', &srv, 0, 2000);

        let mut confirmed = srv.clone();
        confirmed.set(0, 0, Cell { ch: 'a' });
        confirmed.move_cursor(0, 1);
        engine.reconcile(1100, 1050, &confirmed);

        assert!(engine.predictions().iter().all(|p| !matches!(p.target, PredictionTarget::Cell { row: 0, col: 0, .. })));
    }

    #[test]
    fn server_not_yet_caught_up_leaves_the_prediction_pending() {
        let mut engine = PredictionEngine::new(PredictionMode::Always);
        let srv = server(3, 10);
        engine.predict_keystroke(1000, b'a', &srv, 0, 2000);

        // server_time_ms (900) predates the prediction (1000): pending
        engine.reconcile(1100, 900, &srv);
        assert!(engine.predictions().iter().any(|p| matches!(p.target, PredictionTarget::Cell { row: 0, col: 0, .. })));
    }

    #[test]
    fn a_wrong_prediction_invalidates_its_whole_epoch() {
        let mut engine = PredictionEngine::new(PredictionMode::Always);
        let srv = server(3, 10);
        engine.predict_keystroke(1000, b'a', &srv, 0, 2000);
        engine.predict_keystroke(1001, b'b', &srv, 0, 2000);
        let epoch_before = engine.epoch();

        // server shows something other than what we predicted at (0,0)
        let mismatched = srv.clone();
        engine.reconcile(1100, 1050, &mismatched);

        assert_eq!(engine.epoch(), epoch_before + 1);
        assert!(engine.predictions().is_empty());
    }

    #[test]
    fn adaptive_mode_activates_after_a_wrong_prediction() {
        let mut engine = PredictionEngine::new(PredictionMode::Adaptive);
        let srv = server(3, 10);
        assert_eq!(engine.render(0, &srv).get(0, 0).ch, ' ');

        engine.predict_keystroke(1000, b'a', &srv, 0, 2000);
        engine.reconcile(1100, 1050, &srv); // server never got the 'a': wrong

        engine.predict_keystroke(1200, b'b', &srv, 0, 2000);
        let rendered = engine.render(1200, &srv);
        assert_eq!(rendered.get(0, 0).ch, 'b');
    }

    #[test]
    fn control_byte_flushes_the_overlay() {
        let mut engine = PredictionEngine::new(PredictionMode::Always);
        let srv = server(3, 10);
        engine.predict_keystroke(1000, b'a', &srv, 0, 2000);
        assert!(!engine.predictions().is_empty());

        engine.predict_keystroke(1001, b'\r', &srv, 0, 2000);
        assert!(engine.predictions().is_empty());
    }

    #[test]
    fn per_row_cap_drops_the_oldest_prediction_in_that_row() {
        let mut engine = PredictionEngine::new(PredictionMode::Always);
        let srv = server(1, 100);
        for i in 0..(PER_ROW_CELL_CAP + 1) {
            let mut stepped = srv.clone();
            stepped.move_cursor(0, i);
            engine.predict_keystroke(1000 + i as u64, b'x', &stepped, 0, 5000);
        }
        let cell_count = engine.predictions().iter().filter(|p| p.is_cell()).count();
        assert_eq!(cell_count, PER_ROW_CELL_CAP);
    }
}
