// input.rs
//
//! Byte-stream source for the container parser.
//!
//! Container fields are read at byte granularity only; bit-level access is
//! confined to the LZW code readers, which operate over an in-memory
//! buffer.
use crate::error::Result;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

/// Seekable byte source with little-endian field reads.
///
/// Mark / reset is expressed as caller-held positions: save with
/// [`position`](ByteStream::position), restore with
/// [`seek_to`](ByteStream::seek_to).
pub(crate) struct ByteStream<R: Read + Seek> {
    inner: R,
}

impl<R: Read + Seek> ByteStream<R> {
    /// Wrap a seekable reader
    pub fn new(inner: R) -> Self {
        ByteStream { inner }
    }

    /// Read one unsigned byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    /// Read an unsigned 16-bit little-endian value
    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    /// Fill the whole buffer
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        Ok(self.inner.read_exact(buf)?)
    }

    /// Skip up to `n` bytes, returning the count actually skipped.
    ///
    /// Unlike the field reads, running past the end of the stream is not an
    /// error here; the pre-scan relies on that tolerance.
    pub fn skip(&mut self, n: u64) -> Result<u64> {
        let skipped =
            io::copy(&mut self.inner.by_ref().take(n), &mut io::sink())?;
        Ok(skipped)
    }

    /// Get the current stream position
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute position
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use std::io::Cursor;

    #[test]
    fn little_endian_fields() {
        let mut s = ByteStream::new(Cursor::new([0x2C, 0x01, 0x00, 0xFF]));
        assert_eq!(s.read_u8().unwrap(), 0x2C);
        assert_eq!(s.read_u16_le().unwrap(), 1);
        assert_eq!(s.read_u8().unwrap(), 0xFF);
    }

    #[test]
    fn eof_is_unexpected_end() {
        let mut s = ByteStream::new(Cursor::new([0x47]));
        assert!(s.read_u8().is_ok());
        assert!(matches!(
            s.read_u16_le().unwrap_err(),
            Error::UnexpectedEndOfStream
        ));
    }

    #[test]
    fn skip_is_tolerant_past_eof() {
        let mut s = ByteStream::new(Cursor::new([0u8; 5]));
        assert_eq!(s.skip(3).unwrap(), 3);
        assert_eq!(s.skip(10).unwrap(), 2);
        assert_eq!(s.skip(10).unwrap(), 0);
    }

    #[test]
    fn position_round_trip() {
        let mut s = ByteStream::new(Cursor::new([1u8, 2, 3, 4, 5]));
        s.skip(2).unwrap();
        let saved = s.position().unwrap();
        assert_eq!(s.read_u8().unwrap(), 3);
        s.seek_to(saved).unwrap();
        assert_eq!(s.read_u8().unwrap(), 3);
        s.seek_to(0).unwrap();
        assert_eq!(s.read_u8().unwrap(), 1);
    }
}
