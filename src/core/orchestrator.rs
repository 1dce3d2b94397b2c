//! Drives an event stream through the window engine and writes the
//! resulting records.

use crate::core::window::WindowEngine;
use crate::error::{ParseError, Result, SmaError};
use crate::input::{Event, TimeZonePolicy};
use crate::stats::RunStats;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything a file-to-file run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Newline-delimited JSON events, ordered by timestamp
    pub input_file: PathBuf,
    /// Destination for the aggregate records (created or truncated)
    pub output_file: PathBuf,
    /// Window width in minutes
    pub window_size: u64,
    /// Zone used for naive input timestamps and output dates
    pub timezone: TimeZonePolicy,
}

/// Compute the moving average over `input`, writing one record per minute
/// boundary to `output`.
///
/// Every record but the last is followed by a newline. An empty input
/// writes nothing. The first malformed line aborts the run; records already
/// written stay written.
pub fn run<R, W>(
    mut input: R,
    window_size: u64,
    policy: &TimeZonePolicy,
    mut output: W,
) -> Result<RunStats>
where
    R: BufRead,
    W: Write,
{
    let mut engine = WindowEngine::new(window_size, *policy);

    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let event = decode_line(&buf)
            .and_then(|line| Event::from_input_line(line, policy))
            .map_err(|source| SmaError::Parse {
                line: line_no,
                source,
            })?;

        engine.ingest(event, |record| -> Result<()> {
            writeln!(output, "{record}")?;
            Ok(())
        })?;
    }

    if let Some(record) = engine.finish()? {
        write!(output, "{record}")?;
    }
    output.flush()?;

    let stats = *engine.stats();
    debug!(?stats, "window engine finished");
    Ok(stats)
}

/// Run over files on disk.
///
/// The input is opened before the output is created, so a missing input
/// leaves no empty output file behind.
pub fn run_files(options: &RunOptions) -> Result<RunStats> {
    if same_file(&options.input_file, &options.output_file) {
        return Err(SmaError::InvalidArgument(format!(
            "output file {} would overwrite the input",
            options.output_file.display()
        )));
    }

    let input = File::open(&options.input_file).map_err(|source| SmaError::Open {
        path: options.input_file.clone(),
        source,
    })?;
    let output = File::create(&options.output_file).map_err(|source| SmaError::Open {
        path: options.output_file.clone(),
        source,
    })?;

    info!(
        input = %options.input_file.display(),
        output = %options.output_file.display(),
        window_size = options.window_size,
        timezone = %options.timezone,
        "computing moving average"
    );

    let stats = run(
        BufReader::new(input),
        options.window_size,
        &options.timezone,
        BufWriter::new(output),
    )?;

    info!(
        events = stats.events_read,
        records = stats.records_emitted,
        "moving average written"
    );
    Ok(stats)
}

/// Strip the line terminator and check the bytes are UTF-8.
fn decode_line(bytes: &[u8]) -> std::result::Result<&str, ParseError> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    Ok(std::str::from_utf8(bytes)?)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
