use thiserror::Error;

/// Errors raised while building a board from its flat records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("pin #{pin} references part {part}, but the board only has {parts} parts")]
    PartIndexOutOfRange { pin: usize, part: u32, parts: usize },
}

/// Record dump parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected end of input at {at:?}")]
    UnexpectedEof { at: logos::Span },
    #[error("Expected {expected}, found {found} at {at:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        at: logos::Span,
    },
    #[error("Unknown token {found} at {at:?}")]
    UnknownToken { found: String, at: logos::Span },
    #[error("Trailing input at {at:?}")]
    TrailingInput { at: logos::Span },
    #[error("SExpr {0} not found")]
    MissingChild(String),
    #[error("Value not found for {0}")]
    MissingValue(String),
    #[error("Invalid number {value:?} for {field}")]
    InvalidNumber { field: String, value: String },
    #[error("Escape sequence in {field} value {value:?} is not supported")]
    UnsupportedEscape { field: String, value: String },
    #[error("Unknown record {0}")]
    UnknownRecord(String),
    #[error(transparent)]
    Record(#[from] RecordError),
}
