//! Structured access-log record decoding
//!
//! Log files hold one JSON object per line. Decoding is split into two calls,
//! [`RecordDecoder::more`] to stage the next record and [`RecordDecoder::decode`]
//! to turn it into a [`LogEntry`], so a bad line only costs that one record.

use std::io::{self, BufRead, Read};

use serde::Deserialize;
use thiserror::Error;

use crate::counts::StatusCounts;

/// Longest line accepted as a record, in bytes
pub const MAX_RECORD_LEN: usize = 1024 * 1024;

/// One access-log record. Fields other than `status` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    pub status: u16,
}

/// Why a single record was not counted
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed record on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record on line {line} is longer than {limit} bytes")]
    TooLong { line: usize, limit: usize },

    #[error("status {0} is outside the countable range")]
    StatusOutOfRange(u16),

    #[error("decode called without a staged record")]
    NothingStaged,
}

/// Pull-style record source over a byte stream
pub trait RecordDecoder {
    /// Stage the next record; `false` once the stream is exhausted
    fn more(&mut self) -> io::Result<bool>;

    /// Decode the staged record
    ///
    /// A failure here never poisons the stream; the next `more` call moves on.
    fn decode(&mut self) -> Result<LogEntry, DecodeError>;
}

/// Newline-delimited JSON decoder that reuses one line buffer for the whole file
///
/// Lines are handled as raw bytes, so invalid UTF-8 makes one record
/// malformed instead of failing the read.
pub struct JsonLinesDecoder<R> {
    reader: R,
    line: Vec<u8>,
    line_number: usize,
    staged: bool,
    oversized: bool,
    max_record_len: usize,
}

impl<R: BufRead> JsonLinesDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_record_len(reader, MAX_RECORD_LEN)
    }

    /// Decoder that buffers at most `max_record_len` bytes of any one line
    pub fn with_max_record_len(reader: R, max_record_len: usize) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_number: 0,
            staged: false,
            oversized: false,
            max_record_len: max_record_len.max(1),
        }
    }

    /// 1-based line number of the most recently staged record
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read one line into `self.line`, stopping after `max_record_len` bytes
    ///
    /// Returns the number of bytes consumed; 0 means end of stream. The tail of
    /// an overlong line is discarded without buffering.
    fn read_line_capped(&mut self) -> io::Result<usize> {
        self.line.clear();
        self.oversized = false;

        let limit = self.max_record_len as u64 + 1;
        let mut consumed = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line)?;

        if self.line.len() > self.max_record_len && self.line.last() != Some(&b'\n') {
            self.oversized = true;
            consumed += self.skip_to_newline()?;
        }

        Ok(consumed)
    }

    fn skip_to_newline(&mut self) -> io::Result<usize> {
        let mut skipped = 0;
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(skipped);
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.reader.consume(pos + 1);
                    return Ok(skipped + pos + 1);
                }
                None => {
                    let len = buf.len();
                    self.reader.consume(len);
                    skipped += len;
                }
            }
        }
    }
}

impl<R: BufRead> RecordDecoder for JsonLinesDecoder<R> {
    fn more(&mut self) -> io::Result<bool> {
        if self.staged {
            return Ok(true);
        }

        loop {
            if self.read_line_capped()? == 0 {
                return Ok(false);
            }
            self.line_number += 1;

            // Blank lines are separators, not records
            if self.oversized || !self.line.iter().all(u8::is_ascii_whitespace) {
                self.staged = true;
                return Ok(true);
            }
        }
    }

    fn decode(&mut self) -> Result<LogEntry, DecodeError> {
        if !self.staged {
            return Err(DecodeError::NothingStaged);
        }
        self.staged = false;

        if self.oversized {
            return Err(DecodeError::TooLong {
                line: self.line_number,
                limit: self.max_record_len,
            });
        }

        let entry: LogEntry =
            serde_json::from_slice(&self.line).map_err(|source| DecodeError::Malformed {
                line: self.line_number,
                source,
            })?;

        if !StatusCounts::covers(entry.status) {
            return Err(DecodeError::StatusOutOfRange(entry.status));
        }

        Ok(entry)
    }
}
