use crate::timestamp::TimeConversion;

/// Default ceiling on the number of columns a `#fields` header may declare.
pub const DEFAULT_MAX_COLUMNS: usize = 16384;

/// Which columns to emit, fixed for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelector {
    /// Requested column names in output order; empty means all columns.
    pub columns: Vec<String>,
    pub negate: bool,
    pub output_separator: Option<u8>,
}

impl ColumnSelector {
    pub fn new(columns: Vec<String>) -> Self {
        ColumnSelector {
            columns,
            ..Default::default()
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn with_output_separator(mut self, separator: u8) -> Self {
        self.output_separator = Some(separator);
        self
    }

    pub fn selects_all(&self) -> bool {
        self.columns.is_empty()
    }
}

/// How many header blocks are echoed to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum HeaderVisibility {
    #[default]
    None,
    FirstBlock,
    AllBlocks,
}

impl HeaderVisibility {
    pub fn level(self) -> u8 {
        match self {
            HeaderVisibility::None => 0,
            HeaderVisibility::FirstBlock => 1,
            HeaderVisibility::AllBlocks => 2,
        }
    }

    /// `blocks_seen` is the capped header-block counter (0, 1 or 2).
    pub fn shows(self, blocks_seen: u8) -> bool {
        self.level() >= blocks_seen
    }
}

/// Configuration for a cut run
#[derive(Debug, Clone)]
pub struct CutConfig {
    pub selector: ColumnSelector,
    pub headers: HeaderVisibility,
    pub time_conversion: Option<TimeConversion>,
    pub max_columns: usize,
    pub error_strategy: ErrorStrategy,
    pub debug: bool,
    pub buffer_size: usize,
}

impl Default for CutConfig {
    fn default() -> Self {
        CutConfig {
            selector: ColumnSelector::default(),
            headers: HeaderVisibility::None,
            time_conversion: None,
            max_columns: DEFAULT_MAX_COLUMNS,
            error_strategy: ErrorStrategy::Skip,
            debug: false,
            buffer_size: 65536, // 64KB
        }
    }
}

/// Simple error handling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Skip problematic lines and continue processing
    Skip,
    /// Stop processing on first error
    FailFast,
}
