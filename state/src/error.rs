use std::error::Error;
use std::fmt;

/// A diff failed to apply — either it didn't decode, or it referenced
/// coordinates outside the current state's bounds.
#[derive(Debug)]
pub enum ApplyError {
    Decode(bincode::Error),
    OutOfBounds { row: usize, col: usize, rows: usize, cols: usize },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::Decode(e) => write!(f, "diff did not decode: {}", e),
            ApplyError::OutOfBounds { row, col, rows, cols } => {
                write!(f, "cell ({row}, {col}) out of bounds for a {rows}x{cols} grid")
            }
        }
    }
}

impl Error for ApplyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApplyError::Decode(e) => Some(e),
            ApplyError::OutOfBounds { .. } => None,
        }
    }
}

impl From<bincode::Error> for ApplyError {
    fn from(e: bincode::Error) -> Self {
        ApplyError::Decode(e)
    }
}
