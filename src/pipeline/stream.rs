// src/pipeline/stream.rs
use std::io::{BufRead, ErrorKind, Write};
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{CutError, LineError};
use crate::header::{HeaderKind, HeaderState};
use crate::pipeline::config::{CutConfig, ErrorStrategy};
use crate::pipeline::context::{ProcessingStats, RunState};
use crate::projector::RowProjector;

/// Line-at-a-time driver: header lines update the header state, data
/// lines are projected with whatever state the latest header left.
pub struct CutPipeline {
    config: CutConfig,
    state: HeaderState,
    run: RunState,
    stats: ProcessingStats,
}

impl CutPipeline {
    pub fn new(config: CutConfig) -> Self {
        let state = HeaderState::new(config.selector.output_separator);
        CutPipeline {
            config,
            state,
            run: RunState::new(),
            stats: ProcessingStats::default(),
        }
    }

    pub fn config(&self) -> &CutConfig {
        &self.config
    }

    pub fn header_state(&self) -> &HeaderState {
        &self.state
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    /// Process a single stream
    pub fn process_stream<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        output: &mut W,
    ) -> Result<ProcessingStats, CutError> {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();
        let mut buf = Vec::new();
        let mut line_number = 0;

        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_number += 1;
            stats.lines_read += 1;

            if buf.last() == Some(&b'\n') {
                buf.pop();
            }

            let line = buf.as_slice();
            let emitted = if line.first() == Some(&b'#') {
                stats.header_lines += 1;
                self.process_header(line, line_number, &mut stats)?
            } else {
                self.process_data(line, line_number, &mut stats)?
            };

            if let Some(bytes) = emitted {
                if let Err(e) = output.write_all(&bytes) {
                    if e.kind() == ErrorKind::BrokenPipe {
                        debug!("output closed at line {}", line_number);
                        break;
                    }
                    return Err(e.into());
                }
                stats.lines_output += 1;
            }
        }

        if let Err(e) = output.flush() {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }

        stats.processing_time = start_time.elapsed();
        self.stats.merge(&stats);

        Ok(stats)
    }

    fn process_header(
        &mut self,
        line: &[u8],
        line_number: usize,
        stats: &mut ProcessingStats,
    ) -> Result<Option<Vec<u8>>, CutError> {
        if self.run.enter_header() {
            debug!(
                "line {}: header block {} begins",
                line_number,
                self.run.blocks_seen()
            );
        }
        let show = self.config.headers.shows(self.run.blocks_seen());
        let selector = &self.config.selector;

        match HeaderKind::classify(line, self.state.separators.input) {
            HeaderKind::Separator => {
                self.state = self.state.with_separator(line, selector.output_separator);
                debug!(
                    "line {}: input separator {:#04x}, output separator {:#04x}",
                    line_number, self.state.separators.input, self.state.separators.output
                );
            }
            HeaderKind::Fields => {
                self.state = self
                    .state
                    .with_fields(line, selector, self.config.max_columns)?;
                debug!(
                    "line {}: output indexes {:?}",
                    line_number,
                    self.state.layout.as_ref().map(|l| &l.output_indexes)
                );
                if show {
                    return self.project_header(line, false, line_number, stats);
                }
                return Ok(None);
            }
            HeaderKind::Types => {
                if self.config.time_conversion.is_some() {
                    match self.state.with_types(line) {
                        Ok(state) => {
                            self.state = state;
                            debug!("line {}: time column {:?}", line_number, self.state.time_column);
                        }
                        Err(e) => self.recover(line_number, e, stats)?,
                    }
                }
                if show {
                    let rewrite = self.config.time_conversion.is_some();
                    return self.project_header(line, rewrite, line_number, stats);
                }
                return Ok(None);
            }
            HeaderKind::UnsetField => self.state = self.state.with_unset_field(line),
            HeaderKind::EmptyField => self.state = self.state.with_empty_field(line),
            HeaderKind::Other => {}
        }

        Ok(show.then(|| {
            let mut echoed = Vec::with_capacity(line.len() + 1);
            echoed.extend_from_slice(line);
            echoed.push(b'\n');
            echoed
        }))
    }

    fn project_header(
        &self,
        line: &[u8],
        rewrite_time_type: bool,
        line_number: usize,
        stats: &mut ProcessingStats,
    ) -> Result<Option<Vec<u8>>, CutError> {
        let projected = RowProjector::new(&self.state, self.config.time_conversion.as_ref())
            .and_then(|projector| projector.project_header(line, rewrite_time_type));

        match projected {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                self.recover(line_number, e, stats)?;
                stats.lines_skipped += 1;
                Ok(None)
            }
        }
    }

    fn process_data(
        &mut self,
        line: &[u8],
        line_number: usize,
        stats: &mut ProcessingStats,
    ) -> Result<Option<Vec<u8>>, CutError> {
        self.run.enter_data();

        let projected = RowProjector::new(&self.state, self.config.time_conversion.as_ref())
            .and_then(|projector| projector.project_data(line));

        match projected {
            Ok(projected) => {
                for warning in projected.warnings {
                    self.recover(line_number, warning.into(), stats)?;
                }
                Ok(Some(projected.bytes))
            }
            Err(e) => {
                self.recover(line_number, e, stats)?;
                stats.lines_skipped += 1;
                Ok(None)
            }
        }
    }

    /// Log a per-line problem and carry on, or escalate it under `FailFast`.
    fn recover(
        &self,
        line_number: usize,
        error: LineError,
        stats: &mut ProcessingStats,
    ) -> Result<(), CutError> {
        stats.errors += 1;
        match self.config.error_strategy {
            ErrorStrategy::FailFast => Err(CutError::Line {
                line_number,
                source: error,
            }),
            ErrorStrategy::Skip => {
                warn!("line {}: {}", line_number, error);
                Ok(())
            }
        }
    }

    /// Get current accumulated stats
    pub fn get_stats(&self) -> &ProcessingStats {
        &self.stats
    }
}
