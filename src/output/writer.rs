//! Delimited record writer
//!
//! Appends records to a file or stdout in a fixed column order. The header row is
//! written exactly once per destination: a file gets one only when it is new (or
//! empty), stdout gets one on the writer's first flush.

use crate::config::{LineTerminator, OutputConfig};
use crate::output::OutputError;
use crate::record::{Record, Schema};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Where rows go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// `None` and `-` both mean stdout
    pub fn from_option(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p.as_os_str() != "-" => Destination::File(p.to_path_buf()),
            _ => Destination::Stdout,
        }
    }
}

/// Row formatting shared by every destination
#[derive(Debug, Clone, Copy)]
pub struct RowFormat {
    pub delimiter: u8,
    pub terminator: LineTerminator,
}

impl Default for RowFormat {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            terminator: LineTerminator::Crlf,
        }
    }
}

impl From<&OutputConfig> for RowFormat {
    fn from(config: &OutputConfig) -> Self {
        Self {
            delimiter: config.delimiter_byte(),
            terminator: config.line_terminator,
        }
    }
}

/// Appends record groups to one destination
#[derive(Debug)]
pub struct RecordWriter {
    schema: Schema,
    destination: Destination,
    format: RowFormat,
    header_written: bool,
}

impl RecordWriter {
    pub fn new(schema: Schema, destination: Destination, format: RowFormat) -> Self {
        Self {
            schema,
            destination,
            format,
            header_written: false,
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Appends `records` to the destination
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of data rows written
    /// * `Err(OutputError)` - The destination could not be opened or written
    pub fn write(&mut self, records: &[Record]) -> Result<usize, OutputError> {
        match &self.destination {
            Destination::File(path) => {
                let header = needs_header(path)?;
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                let written = write_records(file, self.schema, self.format, records, header)?;
                self.header_written |= header;
                Ok(written)
            }
            Destination::Stdout => self.write_stream(io::stdout().lock(), records),
        }
    }

    /// Appends `records` to a stream that lives as long as the writer
    ///
    /// The header goes out with the first call only.
    fn write_stream<W: Write>(
        &mut self,
        sink: W,
        records: &[Record],
    ) -> Result<usize, OutputError> {
        let header = !self.header_written;
        let written = write_records(sink, self.schema, self.format, records, header)?;
        self.header_written = true;
        Ok(written)
    }
}

/// A file needs a header when it does not exist yet or holds nothing
fn needs_header(path: &Path) -> Result<bool, OutputError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Serializes records to any sink
///
/// Missing fields serialize as empty strings; values containing the delimiter,
/// quotes or line breaks are quoted.
pub fn write_records<W: Write>(
    sink: W,
    schema: Schema,
    format: RowFormat,
    records: &[Record],
    include_header: bool,
) -> Result<usize, OutputError> {
    let terminator = match format.terminator {
        LineTerminator::Crlf => csv::Terminator::CRLF,
        LineTerminator::Lf => csv::Terminator::Any(b'\n'),
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter)
        .terminator(terminator)
        .has_headers(false)
        .from_writer(sink);

    if include_header {
        writer.write_record(schema.header())?;
    }

    for record in records {
        writer.write_record(schema.row(record))?;
    }

    writer.flush()?;
    Ok(records.len())
}
