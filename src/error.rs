/// Fatal errors: these stop the whole run with a non-zero exit status.
#[derive(Debug, thiserror::Error)]
pub enum CutError {
    #[error("too many columns in #fields header: {count} > {max}")]
    TooManyColumns { count: usize, max: usize },

    #[error("output separator must be exactly one character (a single byte), got {0:?}")]
    InvalidOutputSeparator(String),

    #[error("invalid time format string {0:?}")]
    InvalidTimeFormat(String),

    #[error("line {line_number}: {source}")]
    Line {
        line_number: usize,
        #[source]
        source: LineError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Problems confined to a single input line. Under the default error
/// strategy these are logged and the line is dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LineError {
    #[error("too few fields: expected {expected}, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("data line before any #fields header")]
    NoFieldsHeader,

    #[error("{0}")]
    Timestamp(#[from] TimeError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    #[error("not a numeric timestamp: {0:?}")]
    NotNumeric(String),

    #[error("timestamp out of range: {0}")]
    OutOfRange(i64),

    #[error("failed to format timestamp with {0:?}")]
    Format(String),

    #[error("formatted time too long: {length} > {max}")]
    TooLong { length: usize, max: usize },
}
