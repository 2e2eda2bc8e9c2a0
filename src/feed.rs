use state::{Cell, KeystrokeState, State, TerminalState};

/// How raw local input bytes turn into the next value of a `Local` state.
/// Keystrokes are trivial (append); a framebuffer needs its own notion of
/// "type these bytes at the cursor" (§6's PTY collaborator stands in for
/// real terminal parsing, which stays out of scope).
pub trait FeedBytes: State {
    fn fed(&self, bytes: &[u8]) -> Self;
}

impl FeedBytes for KeystrokeState {
    fn fed(&self, bytes: &[u8]) -> Self {
        let mut next = self.clone();
        next.push_str(bytes);
        next
    }
}

/// Not a general escape-sequence parser: printable bytes overwrite the
/// cell under the cursor and advance, `\r` returns to column 0, `\n`
/// advances a row and clamps at the bottom instead of scrolling. A real
/// terminal emulator is the named-but-out-of-scope PTY collaborator; this
/// is only enough to exercise the framebuffer `State` end to end.
impl FeedBytes for TerminalState {
    fn fed(&self, bytes: &[u8]) -> Self {
        let mut next = self.clone();
        let (rows, cols) = next.dimensions();
        let (mut row, mut col) = next.cursor();

        for &byte in bytes {
            match byte {
                b'\r' => col = 0,
                b'\n' => row = (row + 1).min(rows.saturating_sub(1)),
                0x20..=0x7e => {
                    next.set(row, col, Cell { ch: byte as char });
                    col += 1;
                    if col >= cols {
                        col = 0;
                        row = (row + 1).min(rows.saturating_sub(1));
                    }
                }
                _ => {}
            }
        }

        next.move_cursor(row, col);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keystroke_state_appends() {
        let mut state = KeystrokeState::new();
        state.push_str(b"ls");
        let next = state.fed(b" -la\n");
        assert_eq!(next.as_bytes(), b"ls -la\n");
    }

    #[test]
    fn terminal_state_writes_printable_bytes_and_wraps() {
        let state = TerminalState::new(2, 3);
        let next = state.fed(b"abcd");
        assert_eq!(next.get(0, 0).ch, 'a');
        assert_eq!(next.get(0, 2).ch, 'c');
        assert_eq!(next.get(1, 0).ch, 'd');
        assert_eq!(next.cursor(), (1, 1));
    }

    #[test]
    fn terminal_state_handles_cr_lf() {
        let state = TerminalState::new(2, 3);
        let next = state.fed(b"ab\r\ncd");
        assert_eq!(next.get(0, 0).ch, 'a');
        assert_eq!(next.get(1, 0).ch, 'c');
        assert_eq!(next.cursor(), (1, 2));
    }
}
