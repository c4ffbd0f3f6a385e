// private.rs
//
//! Private module for top-level items
use crate::decode::{BlockFilter, Reader};
use crate::error::Result;
use std::io::{Read, Seek};

/// GIF stream decoder.
///
/// Configures how a stream is read, then [open](Decoder::open)s it as a
/// pull-style [Reader].  Opening is eager: the header, logical screen
/// descriptor and global color table are parsed, and the stream is
/// pre-scanned for its total frame count.
///
/// ## Example: read every frame of a GIF
/// ```
/// use std::io::Cursor;
///
/// # fn main() -> Result<(), gifread::Error> {
/// # let gif = [
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00,
/// #   0x01, 0x00, 0x80, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
/// #   0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
/// #   0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44,
/// #   0x01, 0x00, 0x3B,
/// # ];
/// // ... open a `File` as "gif"
/// let mut reader = gifread::Decoder::new(Cursor::new(&gif[..])).open()?;
/// println!("{} frames", reader.total_frames());
/// while reader.has_remaining() {
///     if let Some(frame) = reader.next_frame()? {
///         println!("frame {}: {}x{}", frame.index, frame.width, frame.height);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Decoder<R: Read + Seek> {
    /// Source for input data
    reader: R,
    /// Compose frames onto a logical-screen canvas
    rendered: bool,
    /// Block filter to attach at open
    filter: Option<BlockFilter>,
    /// Maximum decoded image size, in bytes
    max_image_sz: Option<usize>,
}

impl<R: Read + Seek> Decoder<R> {
    /// Create a new GIF decoder.
    pub fn new(reader: R) -> Self {
        Decoder {
            reader,
            rendered: false,
            filter: None,
            max_image_sz: Some(1 << 25),
        }
    }

    /// Deliver fully-rendered logical-screen frames instead of raw
    /// sub-images.
    ///
    /// Rendered frames are composed with the prior frame's disposal method,
    /// so each carries the complete screen contents at that step.
    pub fn rendered(mut self, rendered: bool) -> Self {
        self.rendered = rendered;
        self
    }

    /// Attach a block filter consulted before each block is consumed.
    pub fn filter(mut self, filter: BlockFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the maximum image size (in bytes) to allow for decoding.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.max_image_sz = max_image_sz;
        self
    }

    /// Open the stream as a frame [Reader].
    pub fn open(self) -> Result<Reader<R>> {
        Reader::open(
            self.reader,
            self.rendered,
            self.filter,
            self.max_image_sz,
        )
    }
}
