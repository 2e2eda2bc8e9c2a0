use serde_derive::{Deserialize, Serialize};

use crate::{ApplyError, State};

/// A single glyph on the grid. Kept deliberately minimal: a character and
/// nothing else — styling is out of scope for this rewrite's framebuffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub ch: char,
}

impl Default for Cell {
    fn default() -> Self {
        Cell { ch: ' ' }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
enum CellOp {
    Resize { rows: usize, cols: usize },
    SetCell { row: usize, col: usize, cell: Cell },
    MoveCursor { row: usize, col: usize },
}

/// A row/column grid of styled cells plus cursor position (§4.1). Diffs are
/// a compact list of cell-rewrite and cursor-move operations, computed by
/// comparing two grids cell by cell — this is this crate's business, not
/// the transport's.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TerminalState {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    cursor_row: usize,
    cursor_col: usize,
}

impl TerminalState {
    pub fn new(rows: usize, cols: usize) -> Self {
        TerminalState { rows, cols, cells: vec![Cell::default(); rows * cols], cursor_row: 0, cursor_col: 0 }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row * self.cols + col] = cell;
    }

    pub fn move_cursor(&mut self, row: usize, col: usize) {
        self.cursor_row = row;
        self.cursor_col = col;
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        let mut grid = vec![Cell::default(); rows * cols];
        for row in 0..self.rows.min(rows) {
            for col in 0..self.cols.min(cols) {
                grid[row * cols + col] = self.get(row, col);
            }
        }
        self.rows = rows;
        self.cols = cols;
        self.cells = grid;
        self.cursor_row = self.cursor_row.min(rows.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(cols.saturating_sub(1));
    }

    fn ops_from(&self, existing: &Self) -> Vec<CellOp> {
        let mut ops = Vec::new();
        if (self.rows, self.cols) != (existing.rows, existing.cols) {
            ops.push(CellOp::Resize { rows: self.rows, cols: self.cols });
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                let current = self.get(row, col);
                let prior = if row < existing.rows && col < existing.cols { existing.get(row, col) } else { Cell::default() };
                if current != prior {
                    ops.push(CellOp::SetCell { row, col, cell: current });
                }
            }
        }
        if (self.cursor_row, self.cursor_col) != (existing.cursor_row, existing.cursor_col) {
            ops.push(CellOp::MoveCursor { row: self.cursor_row, col: self.cursor_col });
        }
        ops
    }

    fn apply_op(&mut self, op: &CellOp) -> Result<(), ApplyError> {
        match *op {
            CellOp::Resize { rows, cols } => self.resize(rows, cols),
            CellOp::SetCell { row, col, cell } => {
                if row >= self.rows || col >= self.cols {
                    return Err(ApplyError::OutOfBounds { row, col, rows: self.rows, cols: self.cols });
                }
                self.set(row, col, cell);
            }
            CellOp::MoveCursor { row, col } => self.move_cursor(row, col),
        }
        Ok(())
    }
}

impl State for TerminalState {
    /// Serializes ops one at a time, stopping before exceeding the length
    /// limit rather than truncating mid-op — a partial result here is still
    /// a valid (shorter) op sequence, completed by a later tick.
    fn diff_from(&self, existing: &Self, length_limit: Option<usize>) -> Vec<u8> {
        let ops = self.ops_from(existing);
        match length_limit {
            None => bincode::serialize(&ops).expect("CellOp list is plain-old-data"),
            Some(limit) => {
                let mut included = Vec::new();
                for op in &ops {
                    let mut candidate = included.clone();
                    candidate.push(op.clone());
                    let candidate_len = bincode::serialized_size(&candidate).unwrap_or(u64::MAX) as usize;
                    if candidate_len > limit {
                        break;
                    }
                    included = candidate;
                }
                bincode::serialize(&included).expect("CellOp list is plain-old-data")
            }
        }
    }

    fn init_diff(&self) -> Vec<u8> {
        self.diff_from(&TerminalState::new(self.rows, self.cols), None)
    }

    fn apply_string(&mut self, diff: &[u8]) -> Result<(), ApplyError> {
        let ops: Vec<CellOp> = bincode::deserialize(diff)?;
        for op in &ops {
            self.apply_op(op)?;
        }
        Ok(())
    }

    fn equal(&self, other: &Self) -> bool {
        self == other
    }

    /// Framebuffers are never subtracted from — only the keystroke state's
    /// sender side needs to drop a confirmed prefix (§4.1).
    fn subtract(&mut self, _prefix: &Self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_from_empty_is_init_diff() {
        let mut current = TerminalState::new(2, 3);
        current.set(0, 0, Cell { ch: 'x' });
        assert_eq!(current.diff_from(&TerminalState::new(2, 3), None), current.init_diff());
    }

    #[test]
    fn round_trips_cell_changes_and_cursor_move() {
        let existing = TerminalState::new(3, 3);
        let mut current = existing.clone();
        current.set(1, 1, Cell { ch: 'A' });
        current.move_cursor(1, 2);

        let diff = current.diff_from(&existing, None);
        let mut reconstructed = existing.clone();
        reconstructed.apply_string(&diff).unwrap();
        assert!(reconstructed.equal(&current));
    }

    #[test]
    fn round_trips_resize() {
        let existing = TerminalState::new(2, 2);
        let mut current = TerminalState::new(4, 5);
        current.set(3, 4, Cell { ch: 'z' });

        let diff = current.diff_from(&existing, None);
        let mut reconstructed = existing.clone();
        reconstructed.apply_string(&diff).unwrap();
        assert!(reconstructed.equal(&current));
    }

    #[test]
    fn length_limited_diff_is_a_valid_prefix_of_ops() {
        let existing = TerminalState::new(1, 10);
        let mut current = existing.clone();
        for col in 0..10 {
            current.set(0, col, Cell { ch: 'a' });
        }

        let full = current.diff_from(&existing, None);
        let limited = current.diff_from(&existing, Some(full.len() / 2));
        assert!(limited.len() <= full.len());

        let mut reconstructed = existing.clone();
        reconstructed.apply_string(&limited).unwrap();
        assert!(!reconstructed.equal(&current), "a partial diff should not already equal the target");
    }

    #[test]
    fn out_of_bounds_cell_is_rejected() {
        let mut state = TerminalState::new(2, 2);
        let bogus = bincode::serialize(&vec![CellOp::SetCell { row: 5, col: 5, cell: Cell::default() }]).unwrap();
        assert!(state.apply_string(&bogus).is_err());
    }
}
