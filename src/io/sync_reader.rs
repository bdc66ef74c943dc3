//! Synchronous CSV reader with iterator interface
//!
//! Streams lending commands from a CSV file one row at a time, delegating
//! format concerns to the csv_format module.
//!
//! ```no_run
//! use library_lending_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Replaying {:?}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Failing to open the file is returned from `new()`
//! - A malformed row is yielded as an `Err` carrying its line number, and
//!   iteration continues with the next row

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::LendingCommand;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// Memory use stays constant regardless of file size.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a command CSV for streaming
    ///
    /// Fields are trimmed and rows may omit trailing optional columns.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if the file opened
    /// * `Err(String)` if it could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<LendingCommand, String>;

    /// Next command, or the reason its row was rejected
    fn next(&mut self) -> Option<Self::Item> {
        let mut rows = self.reader.deserialize::<CsvRecord>();
        let row = rows.next()?;

        // Line 1 is the header
        self.line_num += 1;
        let line = self.line_num + 1;

        Some(match row {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|e| format!("Line {}: {}", line, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}
