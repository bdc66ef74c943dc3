//! Asynchronous CSV reader with batch interface
//!
//! Reads lending commands in batches with csv-async so the async strategy can
//! hand each batch to the batch processor.
//!
//! ```text
//! CSV file → AsyncReader → Vec<LendingCommand> per batch
//!                ↓
//!         csv_format module
//!         (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::LendingCommand;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader
///
/// Rows that fail to parse are logged, counted and skipped.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    rejected: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader over CSV data
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
            rejected: 0,
        }
    }

    /// Read up to `batch_size` commands
    ///
    /// # Returns
    ///
    /// The commands parsed from the next rows, in file order. Empty once the
    /// end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LendingCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let Some(row) = rows.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match row.map_err(|e| format!("CSV parse error: {}", e)).and_then(convert_csv_record) {
                Ok(command) => batch.push(command),
                Err(error) => {
                    self.rejected += 1;
                    tracing::warn!(line, %error, "skipping malformed row");
                }
            }
        }

        batch
    }

    /// Number of rows skipped so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    fn reader(rows: &'static str) -> AsyncReader<Cursor<Vec<u8>>> {
        let content = format!("type,member,book,date,due,copies\n{}", rows);
        AsyncReader::new(Cursor::new(content.into_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_reads_in_batches() {
        let mut async_reader = reader(
            "stock,,1,,,1\n\
             stock,,2,,,1\n\
             join,10,1,,,\n\
             join,10,2,,,\n\
             leave,10,2,,,\n",
        );

        let first = async_reader.read_batch(2).await;
        let second = async_reader.read_batch(2).await;
        let third = async_reader.read_batch(2).await;
        let fourth = async_reader.read_batch(2).await;

        assert_eq!(
            first,
            vec![
                LendingCommand::Stock { book: 1, copies: 1 },
                LendingCommand::Stock { book: 2, copies: 1 },
            ]
        );
        assert_eq!(
            second,
            vec![
                LendingCommand::Join { member: 10, book: 1 },
                LendingCommand::Join { member: 10, book: 2 },
            ]
        );
        assert_eq!(third, vec![LendingCommand::Leave { member: 10, book: 2 }]);
        assert!(fourth.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("");

        assert!(async_reader.read_batch(10).await.is_empty());
        assert_eq!(async_reader.rejected(), 0);
    }

    #[tokio::test]
    async fn test_async_reader_skips_and_counts_bad_rows() {
        let mut async_reader = reader(
            "renew,10,1,,,\n\
             join,oops,1,,,\n\
             issue,10,1,2024-03-01,2024-03-08,\n",
        );

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].book(), 1);
        assert_eq!(async_reader.rejected(), 2);
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_and_case() {
        let mut async_reader = reader("  JOIN  ,  10  ,  3  ,,,\n");

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch, vec![LendingCommand::Join { member: 10, book: 3 }]);
    }
}
