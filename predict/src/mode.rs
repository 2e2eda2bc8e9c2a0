use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// How aggressively the client shows speculative local echo (§4.6,
/// `MOSH_PREDICTION_DISPLAY`).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PredictionMode {
    Never,
    Always,
    Adaptive,
}

#[derive(Debug)]
pub struct ParseModeError(String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized prediction mode {:?}, expected one of adaptive, always, never", self.0)
    }
}

impl Error for ParseModeError {}

impl FromStr for PredictionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(PredictionMode::Never),
            "always" => Ok(PredictionMode::Always),
            "adaptive" => Ok(PredictionMode::Adaptive),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PredictionMode::Never => "never",
            PredictionMode::Always => "always",
            PredictionMode::Adaptive => "adaptive",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for mode in [PredictionMode::Never, PredictionMode::Always, PredictionMode::Adaptive] {
            assert_eq!(mode.to_string().parse::<PredictionMode>().unwrap(), mode);
        }
    }

    #[test]
    fn rejects_unknown_modes() {
        assert!("sometimes".parse::<PredictionMode>().is_err());
    }
}
