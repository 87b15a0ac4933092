//! Record streams
//!
//! Exchange files are a sequence of records. Each record is normally preceded by a
//! 4-byte big-endian length (the record descriptor word). Unframed files concatenate
//! records; their boundaries are derived from each record's type and, for image view
//! data records, from the variable-section length fields.
//!
//! # Error Handling
//!
//! - End of input exactly on a record boundary ends the stream
//! - End of input inside a record is a `MalformedRecord` carrying the byte offset

use super::layout::RecordType;
use super::{decode, encode, parse_length, Charset, Record};
use crate::types::X9Error;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read, Write};
use tracing::debug;

/// Largest record a length prefix may announce
const MAX_RECORD_LENGTH: u32 = 10_000_000 + 1_000;

/// How records are delimited within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// 4-byte big-endian length before every record
    #[default]
    LengthPrefixed,
    /// Records concatenated without delimiters
    Unframed,
}

impl Framing {
    /// Guess framing and charset from the first bytes of a file
    ///
    /// A length-prefixed file starts with a zero byte (the high byte of a small record
    /// length); an unframed file starts directly with the `01` record type.
    pub fn detect(head: &[u8]) -> Option<(Framing, Charset)> {
        if let Some(charset) = Charset::detect(head) {
            return Some((Framing::Unframed, charset));
        }
        if head.len() >= 6 && head[0] == 0 {
            return Charset::detect(&head[4..6]).map(|charset| (Framing::LengthPrefixed, charset));
        }
        None
    }
}

/// Writes encoded records to an output stream
pub struct RecordWriter<W: Write> {
    inner: W,
    charset: Charset,
    framing: Framing,
    records_written: u64,
    bytes_written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W, charset: Charset, framing: Framing) -> Self {
        Self {
            inner,
            charset,
            framing,
            records_written: 0,
            bytes_written: 0,
        }
    }

    /// Encode and write one record
    pub fn write_record(&mut self, record: &Record) -> Result<(), X9Error> {
        let bytes = encode(record, self.charset)?;
        if self.framing == Framing::LengthPrefixed {
            let len = u32::try_from(bytes.len())
                .ok()
                .filter(|&len| len <= MAX_RECORD_LENGTH)
                .ok_or_else(|| {
                    X9Error::field_overflow(
                        record.record_type().code(),
                        "RecordLength",
                        &bytes.len().to_string(),
                        4,
                    )
                })?;
            self.inner.write_all(&len.to_be_bytes())?;
            self.bytes_written += 4;
        }
        self.inner.write_all(&bytes)?;
        self.bytes_written += bytes.len() as u64;
        self.records_written += 1;
        debug!(
            record_type = record.record_type().code(),
            len = bytes.len(),
            "Record written"
        );
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn flush(&mut self) -> Result<(), X9Error> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Streams decoded records from an input
///
/// Implements `Iterator<Item = Result<Record, X9Error>>`. After the first error the
/// iterator is exhausted: a broken record boundary makes the rest of the file
/// unreadable.
pub struct RecordReader<R: Read> {
    inner: BufReader<R>,
    charset: Charset,
    framing: Framing,
    offset: u64,
    failed: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R, charset: Charset, framing: Framing) -> Self {
        Self {
            inner: BufReader::with_capacity(64 * 1024, inner),
            charset,
            framing,
            offset: 0,
            failed: false,
        }
    }

    /// Create a reader that detects framing and charset from the first bytes
    pub fn detect(inner: R) -> Result<Self, X9Error> {
        let mut reader = BufReader::with_capacity(64 * 1024, inner);
        let head = reader.fill_buf()?;
        let (framing, charset) = Framing::detect(head).ok_or_else(|| {
            X9Error::malformed_at(0, "cannot detect record framing or character set")
        })?;
        debug!(?framing, ?charset, "Detected file format");
        Ok(Self {
            inner: reader,
            charset,
            framing,
            offset: 0,
            failed: false,
        })
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Byte offset of the next record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read exactly `len` bytes, or `None` on a clean end of input when `len` bytes
    /// were not started
    fn read_exact_or_eof(&mut self, len: usize, allow_eof: bool) -> Result<Option<Vec<u8>>, X9Error> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.inner.read(&mut buf[filled..])?;
            if n == 0 {
                if filled == 0 && allow_eof {
                    return Ok(None);
                }
                return Err(X9Error::malformed_at(
                    self.offset,
                    format!("unexpected end of file after {} of {} bytes", filled, len),
                ));
            }
            filled += n;
        }
        Ok(Some(buf))
    }

    fn read_framed(&mut self) -> Result<Option<Vec<u8>>, X9Error> {
        let prefix = match self.read_exact_or_eof(4, true)? {
            Some(prefix) => prefix,
            None => return Ok(None),
        };
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        if len == 0 || len > MAX_RECORD_LENGTH {
            return Err(X9Error::malformed_at(
                self.offset,
                format!("record length prefix {} is out of range", len),
            ));
        }
        self.offset += 4;
        self.read_exact_or_eof(len as usize, false)
    }

    fn read_unframed(&mut self) -> Result<Option<Vec<u8>>, X9Error> {
        let mut bytes = match self.read_exact_or_eof(2, true)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let record_type = RecordType::from_code(&self.charset.decode(&bytes))
            .map_err(|e| X9Error::malformed_at(self.offset, e.to_string()))?;

        let rest = self
            .read_exact_or_eof(record_type.fixed_length() - 2, false)?
            .unwrap_or_default();
        bytes.extend(rest);

        if record_type.is_variable() {
            for (width, binary) in [(4, false), (5, true), (7, true)] {
                let len_bytes = self.read_exact_or_eof(width, false)?.unwrap_or_default();
                let len = parse_length(&self.charset.decode(&len_bytes), "variable section")
                    .map_err(|e| X9Error::malformed_at(self.offset, e.to_string()))?;
                bytes.extend(len_bytes);
                let section = self.read_exact_or_eof(len, false)?.unwrap_or_default();
                debug!(len, binary, "Variable section read");
                bytes.extend(section);
            }
        }
        Ok(Some(bytes))
    }

    fn next_record(&mut self) -> Result<Option<Record>, X9Error> {
        let start = self.offset;
        let bytes = match self.framing {
            Framing::LengthPrefixed => self.read_framed()?,
            Framing::Unframed => self.read_unframed()?,
        };
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let record = decode(&bytes, self.charset).map_err(|e| match e {
            X9Error::MalformedRecord { message, .. } => X9Error::malformed_at(start, message),
            other => other,
        })?;
        self.offset += bytes.len() as u64;
        if self.framing == Framing::Unframed {
            debug_assert_eq!(self.offset - start, bytes.len() as u64);
        }
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record, X9Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    fn records() -> Vec<Record> {
        let mut image = Record::new(RecordType::ImageViewData);
        image
            .set_variable(super::super::VariableData {
                image_reference_key: String::new(),
                digital_signature: Vec::new(),
                image_data: vec![1, 2, 3, 4, 5],
            })
            .unwrap();
        vec![
            Record::new(RecordType::FileHeader),
            Record::new(RecordType::CheckDetail),
            image,
            Record::new(RecordType::FileControl),
        ]
    }

    fn write_all(charset: Charset, framing: Framing) -> Vec<u8> {
        let mut writer = RecordWriter::new(Vec::new(), charset, framing);
        for record in records() {
            writer.write_record(&record).unwrap();
        }
        writer.flush().unwrap();
        writer.into_inner()
    }

    #[rstest]
    fn test_stream_round_trip(
        #[values(Charset::Ascii, Charset::Ebcdic)] charset: Charset,
        #[values(Framing::LengthPrefixed, Framing::Unframed)] framing: Framing,
    ) {
        let bytes = write_all(charset, framing);
        let reader = RecordReader::new(Cursor::new(bytes), charset, framing);
        let decoded: Vec<Record> = reader.map(Result::unwrap).collect();
        assert_eq!(decoded, records());
    }

    #[test]
    fn test_length_prefix_is_big_endian() {
        let bytes = write_all(Charset::Ascii, Framing::LengthPrefixed);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 80]);
        assert_eq!(&bytes[4..6], b"01");
    }

    #[rstest]
    fn test_detect_format(
        #[values(Charset::Ascii, Charset::Ebcdic)] charset: Charset,
        #[values(Framing::LengthPrefixed, Framing::Unframed)] framing: Framing,
    ) {
        let bytes = write_all(charset, framing);
        let reader = RecordReader::detect(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.charset(), charset);
        assert_eq!(reader.framing(), framing);
        assert_eq!(reader.count(), 4);
    }

    #[test]
    fn test_truncated_stream_reports_offset() {
        let mut bytes = write_all(Charset::Ascii, Framing::LengthPrefixed);
        bytes.truncate(bytes.len() - 10);
        let results: Vec<_> = RecordReader::new(Cursor::new(bytes), Charset::Ascii, Framing::LengthPrefixed)
            .collect();
        assert_eq!(results.len(), 4);
        assert!(results[..3].iter().all(Result::is_ok));
        assert!(matches!(
            results[3],
            Err(X9Error::MalformedRecord { offset: Some(_), .. })
        ));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let bytes = b"42xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx".to_vec();
        let mut reader = RecordReader::new(Cursor::new(bytes), Charset::Ascii, Framing::Unframed);
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_detect_rejects_garbage() {
        assert!(RecordReader::detect(Cursor::new(vec![0xFFu8; 16])).is_err());
    }
}
