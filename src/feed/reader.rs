//! Line-oriented reader over a JSON-lines feed.

use std::io::{BufRead, ErrorKind, Lines};

use crate::feed::{FeedError, MutationRecord};
use crate::types::BookMutation;

/// Decode one non-blank feed line. `line` is only used for error context.
pub fn parse_record(text: &str, line: usize) -> Result<BookMutation, FeedError> {
    let record: MutationRecord =
        serde_json::from_str(text).map_err(|source| FeedError::Json { line, source })?;
    BookMutation::try_from(record).map_err(|source| FeedError::Price { line, source })
}

/// Yields one decoded mutation per record line.
///
/// Blank lines and lines starting with `#` are skipped. A bad line yields an
/// error and the iterator carries on with the next one.
pub struct RecordReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// 1-based number of the last line read
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<BookMutation, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let read = self.lines.next()?;
            self.line += 1;
            let text = match read {
                Ok(text) => text,
                // The offending line is already consumed; the next call resumes after it
                Err(err) if err.kind() == ErrorKind::InvalidData => {
                    return Some(Err(FeedError::Encoding { line: self.line }));
                }
                Err(err) => return Some(Err(FeedError::Io(err))),
            };

            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(parse_record(trimmed, self.line));
        }
    }
}
