use thiserror::Error;

/// Faults raised by the page client. None of these are recovered inside a batch.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("element {selector} unusable: {reason}")]
    Element { selector: String, reason: String },
    #[error("page client session is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read input file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed input row: {0}")]
    Csv(#[from] csv::Error),
    #[error("input row {row} has an empty {column}")]
    EmptyField { row: usize, column: &'static str },
}
