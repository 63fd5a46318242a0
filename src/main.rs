use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};
use std::io::{self, BufReader, LineWriter};

use bro_cut::config::DEFAULT_MAX_COLUMNS;
use bro_cut::{
    logging, ColumnSelector, CutConfig, CutError, CutPipeline, ErrorStrategy, HeaderVisibility,
    TimeConversion, TimeZoneMode,
};

#[derive(Parser, Debug)]
#[command(name = "bro-cut")]
#[command(about = "Extract the given columns from Bro/Zeek logs read on standard input")]
#[command(version)]
#[command(group(ArgGroup::new("header_echo").args(["first_header", "all_headers"])))]
#[command(group(ArgGroup::new("time").args(["local_time", "utc_time", "local_format", "utc_format"])))]
struct Args {
    /// Columns to extract, in output order (default: all)
    #[arg(value_name = "COLUMN")]
    columns: Vec<String>,

    /// Print all columns except the ones given
    #[arg(short = 'n')]
    negate: bool,

    /// Output field separator (a single byte)
    #[arg(short = 'F', value_name = "CHAR")]
    output_separator: Option<String>,

    /// Include the first log's header block in the output
    #[arg(short = 'c')]
    first_header: bool,

    /// Include every log's header block in the output
    #[arg(short = 'C')]
    all_headers: bool,

    /// Convert time values to local time (format from $BRO_CUT_TIMEFMT or the default)
    #[arg(short = 'd')]
    local_time: bool,

    /// Like -d, but in UTC
    #[arg(short = 'u')]
    utc_time: bool,

    /// Like -d, with the given strftime format
    #[arg(short = 'D', value_name = "FMT")]
    local_format: Option<String>,

    /// Like -u, with the given strftime format
    #[arg(short = 'U', value_name = "FMT")]
    utc_format: Option<String>,

    /// Refuse #fields headers declaring more columns than this
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_COLUMNS)]
    max_columns: usize,

    /// Fail on the first malformed line instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Debug mode - show header state changes and final statistics
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn output_separator(&self) -> Result<Option<u8>, CutError> {
        let Some(raw) = &self.output_separator else {
            return Ok(None);
        };
        match raw.as_bytes() {
            [byte] => Ok(Some(*byte)),
            _ => Err(CutError::InvalidOutputSeparator(raw.clone())),
        }
    }

    fn time_conversion(&self) -> Result<Option<TimeConversion>, CutError> {
        let conversion = if let Some(format) = &self.local_format {
            Some(TimeConversion::new(format.as_str(), TimeZoneMode::Local)?)
        } else if let Some(format) = &self.utc_format {
            Some(TimeConversion::new(format.as_str(), TimeZoneMode::Utc)?)
        } else if self.local_time {
            Some(TimeConversion::from_env(TimeZoneMode::Local)?)
        } else if self.utc_time {
            Some(TimeConversion::from_env(TimeZoneMode::Utc)?)
        } else {
            None
        };
        Ok(conversion)
    }

    fn to_config(&self) -> Result<CutConfig, CutError> {
        let selector = ColumnSelector {
            columns: self.columns.clone(),
            negate: self.negate,
            output_separator: self.output_separator()?,
        };

        let headers = if self.all_headers {
            HeaderVisibility::AllBlocks
        } else if self.first_header {
            HeaderVisibility::FirstBlock
        } else {
            HeaderVisibility::None
        };

        Ok(CutConfig {
            selector,
            headers,
            time_conversion: self.time_conversion()?,
            max_columns: self.max_columns,
            error_strategy: if self.fail_fast {
                ErrorStrategy::FailFast
            } else {
                ErrorStrategy::Skip
            },
            debug: self.debug,
            ..CutConfig::default()
        })
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                e.exit();
            }
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    logging::init(args.debug)?;

    let config = args.to_config()?;
    let buffer_size = config.buffer_size;
    let debug = config.debug;

    let mut pipeline = CutPipeline::new(config);

    if debug {
        if let Some(conversion) = &pipeline.config().time_conversion {
            tracing::info!(
                "Converting time columns to {:?} time with format {:?}",
                conversion.zone(),
                conversion.format()
            );
        }
    }

    let input = BufReader::with_capacity(buffer_size, io::stdin().lock());
    let mut output = LineWriter::with_capacity(buffer_size, io::stdout().lock());

    let stats = pipeline
        .process_stream(input, &mut output)
        .context("processing failed")?;

    if debug {
        tracing::info!("Final statistics:");
        tracing::info!("  Lines read: {}", stats.lines_read);
        tracing::info!("  Header lines: {}", stats.header_lines);
        tracing::info!("  Lines output: {}", stats.lines_output);
        tracing::info!("  Lines skipped: {}", stats.lines_skipped);
        tracing::info!("  Errors: {}", stats.errors);
        tracing::info!("  Processing time: {:?}", stats.processing_time);
    }

    Ok(())
}
