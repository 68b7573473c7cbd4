use std::fmt;
use std::io;

/// Everything the engine can report back to a caller.
///
/// The first four variants are contract violations detected at the point
/// of use; a training step that hits one of them is aborted.
#[derive(Debug)]
pub enum NnError {
    /// `backward` was called on a layer whose last forward pass was not in
    /// training mode (or that never ran forward at all).
    StaleGradientState { layer: String },
    /// Two matrices (or a matrix and a label vector) disagree on shape.
    ShapeMismatch {
        context: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// A label index outside `[0, classes)` reached the loss.
    InvalidLabel { row: usize, label: usize, classes: usize },
    /// `train` was called on a network without a loss.
    LossNotConfigured,
    InvalidConfig(String),
    Parse { path: String, line: usize, message: String },
    Io(io::Error),
    Json(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NnError>;

impl fmt::Display for NnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NnError::StaleGradientState { layer } => write!(
                f,
                "stale gradient state in layer '{layer}': backward requires a forward pass in training mode"
            ),
            NnError::ShapeMismatch { context, expected, found } => write!(
                f,
                "shape mismatch in {context}: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            NnError::InvalidLabel { row, label, classes } => write!(
                f,
                "invalid label {label} at row {row}: must be in [0, {classes})"
            ),
            NnError::LossNotConfigured => write!(f, "no loss configured on the network"),
            NnError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            NnError::Parse { path, line, message } => {
                write!(f, "cannot parse {path} line {line}: {message}")
            }
            NnError::Io(e) => write!(f, "io error: {e}"),
            NnError::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for NnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NnError::Io(e) => Some(e),
            NnError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for NnError {
    fn from(e: io::Error) -> Self {
        NnError::Io(e)
    }
}

impl From<serde_json::Error> for NnError {
    fn from(e: serde_json::Error) -> Self {
        NnError::Json(e)
    }
}
