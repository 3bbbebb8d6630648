//! Slicing a continuous byte source into per-record chunks.
//!
//! A WARC file is a plain concatenation of records, so finding record
//! boundaries requires reading each record's header: the payload is binary and
//! may itself contain anything, including byte sequences that look like a
//! version line. [`RecordStream`] therefore never searches the payload for
//! markers. It reads each header up to its terminating blank line, takes the
//! declared `Content-Length`, and consumes exactly that many payload bytes
//! before looking for the next record.

use std::io::{BufRead, Read};
use std::str;

use uncased::UncasedStr;

use crate::variants::AnyRecord;
use crate::version::Version;
use crate::Error;

/// An iterator over the records in a continuous byte source.
///
/// Yields one raw chunk per record: the version line, the header block, the
/// blank line, and exactly the declared number of payload bytes. The record
/// tail and any other CR/LF padding between records is consumed and discarded.
/// Chunks are suitable for [`Record::decode`](crate::Record::decode) or
/// [`AnyRecord::decode`]; use [`records`](Self::records) to get decoded
/// records directly.
///
/// The iterator is fused on failure: segmentation requires a well-formed
/// header, so after any error the position of later records is unknowable and
/// the iterator yields `None` forever.
#[derive(Debug)]
pub struct RecordStream<R> {
    input: R,
    fused: bool,
}

impl<R: BufRead> RecordStream<R> {
    pub fn new(input: R) -> RecordStream<R> {
        RecordStream {
            input,
            fused: false,
        }
    }

    /// Unwrap this stream, returning the underlying byte source.
    pub fn into_inner(self) -> R {
        self.input
    }

    /// Adapt this stream to decode each chunk as it is read.
    pub fn records(self) -> Records<R> {
        Records { chunks: self }
    }

    /// Discard CR and LF bytes until the next non-padding byte.
    ///
    /// This consumes the tail of the preceding record along with any blank
    /// lines between records. Returns false at end of input.
    fn skip_padding(&mut self) -> Result<bool, Error> {
        let mut skipped = 0usize;
        loop {
            let buf = self.input.fill_buf()?;
            if buf.is_empty() {
                if skipped > 0 {
                    trace!("skipped {} padding bytes at end of input", skipped);
                }
                return Ok(false);
            }
            let n = buf
                .iter()
                .take_while(|&&b| b == b'\r' || b == b'\n')
                .count();
            let done = n < buf.len();
            self.input.consume(n);
            skipped += n;
            if done {
                if skipped > 0 {
                    trace!("skipped {} padding bytes between records", skipped);
                }
                return Ok(true);
            }
        }
    }

    /// Read one record chunk, or `None` at end of input.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, Error> {
        if !self.skip_padding()? {
            return Ok(None);
        }

        let mut chunk = Vec::new();

        // Version line first: if the source is not positioned at a record,
        // bail out before misreading arbitrary data as a header.
        if self.input.read_until(b'\n', &mut chunk)? == 0 {
            return Err(unterminated_header());
        }
        let line = str::from_utf8(&chunk)
            .map_err(|_| Error::UnsupportedVersion(String::from_utf8_lossy(&chunk).into_owned()))?;
        Version::parse(line.trim_end_matches(|c| c == '\r' || c == '\n'))?;

        // Header lines up to and including the blank line. read_until consumes
        // exactly through each line terminator, so no payload byte of this or
        // any following record is ever taken from the source.
        let header_start = chunk.len();
        loop {
            let line_start = chunk.len();
            if self.input.read_until(b'\n', &mut chunk)? == 0 {
                return Err(unterminated_header());
            }
            let line = &chunk[line_start..];
            if line == b"\r\n" || line == b"\n" {
                break;
            }
        }

        let declared = declared_length(&chunk[header_start..])?;
        let header_len = chunk.len();

        let copied = (&mut self.input).take(declared).read_to_end(&mut chunk)? as u64;
        if copied < declared {
            return Err(Error::ContentLengthMismatch {
                declared,
                available: copied,
            });
        }

        trace!(
            "segmented record: {} header bytes, {} payload bytes",
            header_len,
            declared
        );
        Ok(Some(chunk))
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<Vec<u8>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                debug!("record stream poisoned: {}", e);
                self.fused = true;
                Some(Err(e))
            }
        }
    }
}

/// An iterator over decoded records, created by [`RecordStream::records`].
#[derive(Debug)]
pub struct Records<R> {
    chunks: RecordStream<R>,
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<AnyRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.chunks.next()?.and_then(|chunk| AnyRecord::decode(&chunk)))
    }
}

/// Extract the declared `Content-Length` from a raw header block.
///
/// Only the length is needed to find the record boundary, so other fields are
/// left untouched for the full decoder.
fn declared_length(header: &[u8]) -> Result<u64, Error> {
    let text = str::from_utf8(header)
        .map_err(|_| Error::InvalidHeaderLine(String::from_utf8_lossy(header).into_owned()))?;
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r');
        if let Some((key, value)) = line.split_once(':') {
            if UncasedStr::new(key.trim()) == UncasedStr::new("Content-Length") {
                let value = value.trim();
                return value.parse().map_err(|_| Error::InvalidFieldValue {
                    field: "content_length",
                    value: value.to_owned(),
                });
            }
        }
    }
    Err(Error::MissingRequiredField("Content-Length"))
}

fn unterminated_header() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "record header is not terminated by a blank line",
    ))
}
