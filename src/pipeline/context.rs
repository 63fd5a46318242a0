use std::time::Duration;

/// The header-block counter saturates here: "two or more" is all the echo
/// policy needs to know.
pub const MAX_BLOCKS_COUNTED: u8 = 2;

/// Where the driver is relative to header blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    #[default]
    Idle,
    InHeaderBlock,
    InDataBlock,
}

/// Block tracking for one run
#[derive(Debug, Clone, Default)]
pub struct RunState {
    block: BlockState,
    blocks_seen: u8,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a header line. Returns true when it opens a new header block.
    pub fn enter_header(&mut self) -> bool {
        let opens_block = self.block != BlockState::InHeaderBlock;
        if opens_block && self.blocks_seen < MAX_BLOCKS_COUNTED {
            self.blocks_seen += 1;
        }
        self.block = BlockState::InHeaderBlock;
        opens_block
    }

    pub fn enter_data(&mut self) {
        self.block = BlockState::InDataBlock;
    }

    pub fn block(&self) -> BlockState {
        self.block
    }

    pub fn blocks_seen(&self) -> u8 {
        self.blocks_seen
    }
}

/// Processing statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub lines_read: usize,
    pub header_lines: usize,
    pub lines_output: usize,
    pub lines_skipped: usize,
    pub errors: usize,
    pub processing_time: Duration,
}

impl ProcessingStats {
    pub fn merge(&mut self, other: &ProcessingStats) {
        self.lines_read += other.lines_read;
        self.header_lines += other.header_lines;
        self.lines_output += other.lines_output;
        self.lines_skipped += other.lines_skipped;
        self.errors += other.errors;
        self.processing_time += other.processing_time;
    }
}
