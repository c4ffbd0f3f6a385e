// block.rs
//
//! Data model for GIF streams: stream metadata, frames and block enums.
use crate::error::Error;

/// Color channels per color table entry (R, G, B in file order)
pub(crate) const CHANNELS: usize = 3;

/// How the prior frame's sub-rectangle is treated before drawing the next
/// frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified
    NoAction,
    /// Leave the graphic in place
    Keep,
    /// Restore the area to the background (transparent)
    Background,
    /// Restore the area to what was there before the graphic
    Previous,
    /// Reserved values 4-7
    Reserved(u8),
}

impl Default for DisposalMethod {
    fn default() -> Self {
        DisposalMethod::NoAction
    }
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            _ => Reserved(n & 0b0111),
        }
    }
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
            Reserved(n) => n & 0b0111,
        }
    }
}

/// Top-level block identifiers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b'!' => Some(Extension_),  // (0x21) Extension introducer
            b',' => Some(ImageDesc_),  // (0x2C) Image separator
            b';' => Some(Trailer_),    // (0x3B) GIF trailer
            _ => None,
        }
    }
}

/// Extension block labels
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    PlainText_,
    GraphicControl_,
    Comment_,
    Application_,
    Unknown_(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x01 => PlainText_,
            0xF9 => GraphicControl_,
            0xFE => Comment_,
            0xFF => Application_,
            _ => Unknown_(n),
        }
    }
}

/// Context passed to a block filter before each block is consumed.
///
/// Returning `true` from the filter makes the reader advance past the block
/// (including any trailing sub-block chain) without producing side effects.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockEvent {
    /// Logical screen descriptor (7 bytes)
    LogicalScreenDesc,
    /// Global color table
    GlobalColorTable,
    /// Graphic control extension (0xF9)
    GraphicControl,
    /// Comment extension (0xFE)
    Comment,
    /// Plain text extension (0x01)
    PlainText,
    /// Application extension (0xFF)
    Application,
    /// Extension with an unrecognized label
    UnknownExtension(u8),
    /// Image descriptor (0x2C)
    ImageDesc,
    /// Local color table of the current frame
    LocalColorTable,
    /// Image data header (LZW minimum code size byte)
    ImageData,
    /// One image data sub-block with the declared length
    ImageDataSub(u8),
}

/// Plain text extension record (character grid plus text lines)
#[derive(Debug, Default)]
pub struct PlainText {
    /// Text grid left position
    pub left: u16,
    /// Text grid top position
    pub top: u16,
    /// Text grid width in pixels
    pub grid_width: u16,
    /// Text grid height in pixels
    pub grid_height: u16,
    /// Character cell width
    pub cell_width: u8,
    /// Character cell height
    pub cell_height: u8,
    /// Foreground color index
    pub foreground_color_index: u8,
    /// Background color index
    pub background_color_index: u8,
    /// Text data, one entry per sub-block
    pub text: Vec<Vec<u8>>,
}

/// Metadata with stream-wide scope: signature / version, logical screen
/// descriptor, global color table, comments, plain text and loop count.
#[derive(Debug, Default)]
pub struct Metadata {
    /// GIF version (`b"87a"` or `b"89a"`)
    pub version: [u8; 3],
    /// Logical screen width
    pub width: u16,
    /// Logical screen height
    pub height: u16,
    /// Global color table flag from the logical screen descriptor
    pub global_color_table_flag: bool,
    /// Color resolution (2, 4, .. 256)
    pub color_resolution: u16,
    /// Global color table ordering flag
    pub sorted: bool,
    /// Declared global color table length (2^(n+1))
    pub global_color_table_size: usize,
    /// Background color index into the global color table
    pub background_color_index: u8,
    /// Pixel aspect ratio field
    pub pixel_aspect_ratio: u8,
    /// Global color table as ARGB entries (alpha 0xFF)
    pub global_color_table: Option<Vec<u32>>,
    /// Comment extension contents, in stream order
    pub comments: Vec<Vec<u8>>,
    /// Plain text extension record, if any
    pub plain_text: Option<PlainText>,
    /// Animation loop count (0 means loop forever)
    pub loop_count: u16,
    /// Number of image descriptors found by the pre-scan
    pub total_frames: usize,
}

impl Metadata {
    /// Logical screen descriptor packed field masks
    pub(crate) const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    pub(crate) const COLOR_RESOLUTION: u8 = 0b0111_0000;
    pub(crate) const COLOR_TABLE_ORDERING: u8 = 0b0000_1000;
    pub(crate) const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Check if a global color table was declared
    pub fn has_global_color_table(&self) -> bool {
        self.global_color_table_flag
    }

    /// Get the background color as ARGB, resolved against the global color
    /// table
    pub fn background_color(&self) -> Option<u32> {
        let table = self.global_color_table.as_deref()?;
        table.get(usize::from(self.background_color_index)).copied()
    }
}

/// One frame of a GIF stream.
///
/// In sub-image mode `data` holds `width * height` ARGB values in scan
/// order; in rendered mode it holds a logical-screen-sized composited
/// canvas.  `data` is `None` when the image data was filtered out or the
/// frame failed to decode (see `error`).
#[derive(Debug, Default)]
pub struct Frame {
    /// Frame index (0-based; filtered frames consume an index)
    pub index: usize,
    /// Left position of the sub-image within the logical screen
    pub left: u16,
    /// Top position of the sub-image within the logical screen
    pub top: u16,
    /// Sub-image width
    pub width: u16,
    /// Sub-image height
    pub height: u16,
    /// Interlace flag from the image descriptor
    pub interlaced: bool,
    /// Local color table ordering flag
    pub sorted: bool,
    /// Local color table flag from the image descriptor
    pub local_color_table_flag: bool,
    /// Declared local color table length (2^(n+1))
    pub local_color_table_size: usize,
    /// Local color table as ARGB entries (alpha 0xFF)
    pub local_color_table: Option<Vec<u32>>,
    /// Disposal method from the graphic control extension
    pub disposal: DisposalMethod,
    /// User input flag from the graphic control extension
    pub user_input: bool,
    /// Transparent color index, when the transparency flag is set
    pub transparent_color: Option<u8>,
    /// Frame delay in centiseconds
    pub delay_cs: u16,
    /// LZW minimum code size (2..=8)
    pub min_code_size: u8,
    /// Decoded ARGB pixels
    pub data: Option<Vec<u32>>,
    /// Image data was filtered out by a block filter
    pub skipped: bool,
    /// Pixels dropped because the LZW stream produced more than
    /// `width * height` values
    pub trimmed: usize,
    /// Frame-level decode error; `data` is `None` when set
    pub error: Option<Error>,
}

impl Frame {
    /// Image descriptor packed field masks
    pub(crate) const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    pub(crate) const INTERLACED: u8 = 0b0100_0000;
    pub(crate) const COLOR_TABLE_ORDERING: u8 = 0b0010_0000;
    pub(crate) const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    /// Graphic control packed field masks
    pub(crate) const DISPOSAL_METHOD: u8 = 0b0001_1100;
    pub(crate) const USER_INPUT: u8 = 0b0000_0010;
    pub(crate) const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    /// Create a frame with the given index
    pub(crate) fn new(index: usize) -> Self {
        Frame {
            index,
            ..Frame::default()
        }
    }

    /// Check if a local color table was declared
    pub fn has_local_color_table(&self) -> bool {
        self.local_color_table_flag
    }

    /// Get the LZW clear code (2^min_code_size)
    pub fn clear_code(&self) -> u16 {
        1 << u16::from(self.min_code_size)
    }

    /// Get the LZW end-of-information code
    pub fn end_of_info_code(&self) -> u16 {
        self.clear_code() + 1
    }

    /// Get the sub-image pixel count
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}
