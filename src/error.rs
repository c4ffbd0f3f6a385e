// error.rs
//
use std::fmt;
use std::io;

/// Errors encountered while reading a GIF stream
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error.
    Io(io::Error),
    /// Bytes 0-5 are not `GIF87a` / `GIF89a`.  Fatal at open.
    InvalidSignature([u8; 6]),
    /// The stream ended in the middle of a required field.
    UnexpectedEndOfStream,
    /// Block identifier not in {0x21, 0x2C, 0x3B}.
    UnknownBlock(u8),
    /// An extension subtype the block filter required to be consumed is
    /// unhandled.
    UnsupportedExtension(u8),
    /// A frame has neither a local nor a global color table.
    MissingColorTable,
    /// LZW code out of range, or referencing an unpopulated table slot.
    CorruptLzwStream,
    /// LZW minimum code size outside 2..=8.
    InvalidCodeSize(u8),
    /// Image larger than the configured maximum decoded size.
    TooLargeImage,
    /// A declared sub-block length was zero where at least 1 is required.
    EmptyBlockSize,
}

/// Reader result type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEndOfStream
        } else {
            Error::Io(err)
        }
    }
}
