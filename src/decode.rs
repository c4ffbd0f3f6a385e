// decode.rs
//
//! GIF container parsing: block dispatch, the frame-count pre-scan and the
//! pull-style reader facade.
use crate::block::{
    BlockCode, BlockEvent, ExtensionCode, Frame, Metadata, PlainText,
    CHANNELS,
};
use crate::error::{Error, Result};
use crate::input::ByteStream;
use crate::lzw;
use crate::render::{deinterlace, Compositor};
use std::io::{Read, Seek};

/// Block filter predicate.
///
/// Consulted before each block is consumed; returning `true` makes the
/// reader advance past the block (including any trailing sub-block chain)
/// without producing side effects.  Must be pure and is invoked many times
/// per frame.
pub type BlockFilter = Box<dyn Fn(BlockEvent) -> bool>;

/// Looping application extension identifier + auth code pairs
const LOOPING_APPS: [(&[u8; 8], &[u8; 3]); 2] =
    [(b"NETSCAPE", b"2.0"), (b"ANIMEXTS", b"1.0")];

/// Pull-style GIF frame reader.
///
/// Created with [Decoder::open](crate::Decoder::open), which eagerly parses
/// the header through the global color table and pre-scans the stream for
/// the total frame count.  Each call to [next_frame](Reader::next_frame)
/// parses forward until one frame is produced or the trailer is reached.
pub struct Reader<R: Read + Seek> {
    /// Source stream; `None` once closed
    stream: Option<ByteStream<R>>,
    /// Stream-wide metadata
    metadata: Metadata,
    /// Block filter, when attached
    filter: Option<BlockFilter>,
    /// Frame under construction (graphic control may precede the
    /// descriptor)
    current: Option<Frame>,
    /// Index of the next frame; filtered frames consume an index
    frame_index: usize,
    /// Canvas compositor, in rendered mode
    compositor: Option<Compositor>,
    /// Maximum decoded image size in bytes
    max_image_sz: Option<usize>,
    /// Trailer reached or reader closed
    done: bool,
}

impl<R: Read + Seek> std::fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("metadata", &self.metadata)
            .field("current", &self.current)
            .field("frame_index", &self.frame_index)
            .field("max_image_sz", &self.max_image_sz)
            .field("done", &self.done)
            .finish()
    }
}

impl<R: Read + Seek> Reader<R> {
    /// Open a reader: parse the preamble and pre-scan the frame count
    pub(crate) fn open(
        reader: R,
        rendered: bool,
        filter: Option<BlockFilter>,
        max_image_sz: Option<usize>,
    ) -> Result<Self> {
        let mut this = Reader {
            stream: Some(ByteStream::new(reader)),
            metadata: Metadata::default(),
            filter,
            current: None,
            frame_index: 0,
            compositor: None,
            max_image_sz,
            done: false,
        };
        this.read_signature()?;
        let (gct_flag, gct_len) = this.read_logical_screen_desc()?;
        this.read_global_color_table(gct_flag, gct_len)?;
        let s = this.stream_mut()?;
        let saved = s.position()?;
        s.seek_to(0)?;
        let total = scan_total_frames(s);
        s.seek_to(saved)?;
        this.metadata.total_frames = total;
        if rendered {
            let screen = usize::from(this.metadata.width)
                * usize::from(this.metadata.height);
            if let Some(max) = this.max_image_sz {
                if screen * 4 > max {
                    return Err(Error::TooLargeImage);
                }
            }
            this.compositor =
                Some(Compositor::new(this.metadata.width, this.metadata.height));
        }
        Ok(this)
    }

    /// Get the stream metadata.
    ///
    /// `total_frames` is authoritative as soon as the reader is open.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Get the total number of frames found by the pre-scan
    pub fn total_frames(&self) -> usize {
        self.metadata.total_frames
    }

    /// Check if frames remain to be read
    pub fn has_remaining(&self) -> bool {
        self.stream.is_some()
            && self.frame_index < self.metadata.total_frames
    }

    /// Attach or replace the block filter
    pub fn set_filter(&mut self, filter: BlockFilter) {
        self.filter = Some(filter);
    }

    /// Close the reader, releasing the underlying stream.  Idempotent.
    pub fn close(&mut self) {
        self.stream = None;
        self.done = true;
    }

    /// Read the next frame.
    ///
    /// Returns `None` at the trailer, or for a frame whose image data was
    /// filtered out (the frame still consumes its index).  A frame-level
    /// decode failure is reported as a frame with no pixel data and an
    /// [error](crate::Frame::error) annotation; stream-level errors close
    /// the reader.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.done || self.stream.is_none() {
            return Ok(None);
        }
        match self.next_frame_inner() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    /// Iterate the remaining frames, skipping filtered ones
    pub fn frames(&mut self) -> Frames<R> {
        Frames { reader: self }
    }

    /// Get the open stream
    fn stream_mut(&mut self) -> Result<&mut ByteStream<R>> {
        self.stream.as_mut().ok_or(Error::UnexpectedEndOfStream)
    }

    /// Consult the block filter
    fn filtered(&self, event: BlockEvent) -> bool {
        match &self.filter {
            Some(f) => f(event),
            None => false,
        }
    }

    /// Take the frame under construction, creating one if no graphic
    /// control extension preceded the image descriptor
    fn take_frame(&mut self) -> Frame {
        match self.current.take() {
            Some(frame) => frame,
            None => {
                let frame = Frame::new(self.frame_index);
                self.frame_index += 1;
                frame
            }
        }
    }

    /// Block loop: parse until a frame is produced or the stream ends
    fn next_frame_inner(&mut self) -> Result<Option<Frame>> {
        loop {
            let b = match self.stream_mut()?.read_u8() {
                Ok(b) => b,
                // a missing trailer ends the stream like one
                Err(Error::UnexpectedEndOfStream) => {
                    self.done = true;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            match BlockCode::from_u8(b) {
                Some(BlockCode::Extension_) => self.read_extension()?,
                Some(BlockCode::ImageDesc_) => {
                    debug!("image descriptor: frame {}", self.frame_index);
                    return self.read_image();
                }
                Some(BlockCode::Trailer_) => {
                    debug!("trailer: {} frames", self.frame_index);
                    self.done = true;
                    return Ok(None);
                }
                None => return Err(Error::UnknownBlock(b)),
            }
        }
    }

    /// Dispatch one extension block by label
    fn read_extension(&mut self) -> Result<()> {
        let label = self.stream_mut()?.read_u8()?;
        match ExtensionCode::from(label) {
            ExtensionCode::GraphicControl_ => self.read_graphic_control(),
            ExtensionCode::Comment_ => self.read_comment(),
            ExtensionCode::PlainText_ => self.read_plain_text(),
            ExtensionCode::Application_ => self.read_application(),
            ExtensionCode::Unknown_(n) => {
                // skipped unless a filter insists the subtype be consumed
                match &self.filter {
                    Some(f) if !f(BlockEvent::UnknownExtension(n)) => {
                        Err(Error::UnsupportedExtension(n))
                    }
                    _ => {
                        debug!("skipping extension {:#04x}", n);
                        skip_sub_blocks(self.stream_mut()?)
                    }
                }
            }
        }
    }

    /// Graphic control extension: disposal, transparency, delay
    fn read_graphic_control(&mut self) -> Result<()> {
        if self.filtered(BlockEvent::GraphicControl) {
            // size byte + 4-byte payload + terminator
            skip_exact(self.stream_mut()?, 6)?;
            return Ok(());
        }
        let s = self.stream_mut()?;
        check_block_size(s)?;
        let packed = s.read_u8()?;
        let delay = s.read_u16_le()?;
        let idx = s.read_u8()?;
        let term = s.read_u8()?;
        if term != 0 {
            debug!("graphic control terminator: {:#04x}", term);
        }
        let index = self.frame_index;
        let created = self.current.is_none();
        let frame = self.current.get_or_insert_with(|| Frame::new(index));
        if created {
            self.frame_index += 1;
        }
        frame.disposal = ((packed & Frame::DISPOSAL_METHOD) >> 2).into();
        frame.user_input = packed & Frame::USER_INPUT != 0;
        frame.transparent_color =
            (packed & Frame::TRANSPARENT_COLOR != 0).then_some(idx);
        frame.delay_cs = delay;
        Ok(())
    }

    /// Comment extension: each sub-block is one comment entry
    fn read_comment(&mut self) -> Result<()> {
        if self.filtered(BlockEvent::Comment) {
            return skip_sub_blocks(self.stream_mut()?);
        }
        let mut comments = vec![];
        read_sub_blocks(self.stream_mut()?, |data| {
            comments.push(data.to_vec());
        })?;
        self.metadata.comments.append(&mut comments);
        Ok(())
    }

    /// Plain text extension: character grid plus text sub-blocks
    fn read_plain_text(&mut self) -> Result<()> {
        if self.filtered(BlockEvent::PlainText) {
            // size byte + 12-byte grid
            skip_exact(self.stream_mut()?, 13)?;
            return skip_sub_blocks(self.stream_mut()?);
        }
        let s = self.stream_mut()?;
        check_block_size(s)?;
        let mut pt = PlainText {
            left: s.read_u16_le()?,
            top: s.read_u16_le()?,
            grid_width: s.read_u16_le()?,
            grid_height: s.read_u16_le()?,
            cell_width: s.read_u8()?,
            cell_height: s.read_u8()?,
            foreground_color_index: s.read_u8()?,
            background_color_index: s.read_u8()?,
            text: vec![],
        };
        read_sub_blocks(s, |data| {
            pt.text.push(data.to_vec());
        })?;
        self.metadata.plain_text = Some(pt);
        Ok(())
    }

    /// Application extension: only the looping sub-block is interpreted
    fn read_application(&mut self) -> Result<()> {
        if self.filtered(BlockEvent::Application) {
            // size byte + 8-byte identifier + 3-byte auth code
            skip_exact(self.stream_mut()?, 12)?;
            return skip_sub_blocks(self.stream_mut()?);
        }
        let s = self.stream_mut()?;
        check_block_size(s)?;
        let mut ident = [0; 8];
        let mut auth = [0; 3];
        s.read_exact(&mut ident)?;
        s.read_exact(&mut auth)?;
        let looping = LOOPING_APPS
            .iter()
            .any(|(i, a)| **i == ident && **a == auth);
        let mut loop_count = None;
        read_sub_blocks(s, |data| {
            if looping
                && loop_count.is_none()
                && data.len() == 3
                && data[0] == 1
            {
                loop_count = Some(u16::from_le_bytes([data[1], data[2]]));
            }
        })?;
        if let Some(count) = loop_count {
            if self.metadata.loop_count == 0 {
                debug!("loop count: {}", count);
                self.metadata.loop_count = count;
            }
        }
        Ok(())
    }

    /// Signature and version; unskippable
    fn read_signature(&mut self) -> Result<()> {
        let s = self.stream_mut()?;
        let mut header = [0; 6];
        s.read_exact(&mut header)?;
        if &header[..3] != b"GIF"
            || !(&header[3..] == b"87a" || &header[3..] == b"89a")
        {
            return Err(Error::InvalidSignature(header));
        }
        self.metadata.version = [header[3], header[4], header[5]];
        Ok(())
    }

    /// Logical screen descriptor.
    ///
    /// The color table flag and length are returned even when the block is
    /// filtered, so the following table can be advanced past.
    fn read_logical_screen_desc(&mut self) -> Result<(bool, usize)> {
        let skip = self.filtered(BlockEvent::LogicalScreenDesc);
        let s = self.stream_mut()?;
        let width = s.read_u16_le()?;
        let height = s.read_u16_le()?;
        let packed = s.read_u8()?;
        let bg = s.read_u8()?;
        let aspect = s.read_u8()?;
        let gct_flag = packed & Metadata::COLOR_TABLE_PRESENT != 0;
        let gct_len = 2 << usize::from(packed & Metadata::COLOR_TABLE_SIZE);
        if !skip {
            let m = &mut self.metadata;
            m.width = width;
            m.height = height;
            m.global_color_table_flag = gct_flag;
            m.color_resolution =
                2 << u16::from((packed & Metadata::COLOR_RESOLUTION) >> 4);
            m.sorted = packed & Metadata::COLOR_TABLE_ORDERING != 0;
            m.global_color_table_size = gct_len;
            m.background_color_index = bg;
            m.pixel_aspect_ratio = aspect;
            debug!("logical screen: {}x{}", width, height);
        }
        Ok((gct_flag, gct_len))
    }

    /// Global color table, when declared
    fn read_global_color_table(
        &mut self,
        gct_flag: bool,
        gct_len: usize,
    ) -> Result<()> {
        if !gct_flag {
            return Ok(());
        }
        if self.filtered(BlockEvent::GlobalColorTable) {
            skip_exact(self.stream_mut()?, (gct_len * CHANNELS) as u64)?;
        } else {
            debug!("global color table: {} entries", gct_len);
            let table = read_color_table(self.stream_mut()?, gct_len)?;
            self.metadata.global_color_table = Some(table);
        }
        Ok(())
    }

    /// Image descriptor, optional local color table and image data
    fn read_image(&mut self) -> Result<Option<Frame>> {
        let mut frame = self.take_frame();
        let (lct_flag, lct_len) = self.read_image_desc(&mut frame)?;
        self.read_local_color_table(&mut frame, lct_flag, lct_len)?;
        self.read_image_data(&mut frame)?;
        if frame.skipped {
            debug!("frame {}: image data skipped", frame.index);
            return Ok(None);
        }
        if let Some(comp) = &mut self.compositor {
            if let Some(pixels) = frame.data.take() {
                frame.data = Some(comp.compose(&frame, &pixels));
                frame.left = 0;
                frame.top = 0;
                frame.width = self.metadata.width;
                frame.height = self.metadata.height;
            }
        }
        Ok(Some(frame))
    }

    /// Image descriptor fields.
    ///
    /// As with the logical screen descriptor, the local color table flag
    /// and length are returned even when the block is filtered.
    fn read_image_desc(&mut self, frame: &mut Frame) -> Result<(bool, usize)> {
        let skip = self.filtered(BlockEvent::ImageDesc);
        let s = self.stream_mut()?;
        let left = s.read_u16_le()?;
        let top = s.read_u16_le()?;
        let width = s.read_u16_le()?;
        let height = s.read_u16_le()?;
        let packed = s.read_u8()?;
        let lct_flag = packed & Frame::COLOR_TABLE_PRESENT != 0;
        let lct_len = 2 << usize::from(packed & Frame::COLOR_TABLE_SIZE);
        if skip {
            return Ok((lct_flag, lct_len));
        }
        frame.left = left;
        frame.top = top;
        frame.width = width;
        frame.height = height;
        frame.interlaced = packed & Frame::INTERLACED != 0;
        frame.sorted = packed & Frame::COLOR_TABLE_ORDERING != 0;
        frame.local_color_table_flag = lct_flag;
        frame.local_color_table_size = if lct_flag { lct_len } else { 0 };
        if let Some(max) = self.max_image_sz {
            if frame.image_sz() * 4 > max {
                return Err(Error::TooLargeImage);
            }
        }
        Ok((lct_flag, lct_len))
    }

    /// Local color table, when declared by the descriptor
    fn read_local_color_table(
        &mut self,
        frame: &mut Frame,
        lct_flag: bool,
        lct_len: usize,
    ) -> Result<()> {
        if !lct_flag {
            return Ok(());
        }
        if self.filtered(BlockEvent::LocalColorTable) {
            skip_exact(self.stream_mut()?, (lct_len * CHANNELS) as u64)?;
        } else {
            debug!("local color table: {} entries", lct_len);
            let table = read_color_table(self.stream_mut()?, lct_len)?;
            frame.local_color_table = Some(table);
        }
        Ok(())
    }

    /// Image data: collect the sub-block chain and decode it.
    ///
    /// Filtering the header or any sub-block suppresses the decode and
    /// marks the frame skipped.
    fn read_image_data(&mut self, frame: &mut Frame) -> Result<()> {
        if self.filtered(BlockEvent::ImageData) {
            let s = self.stream_mut()?;
            skip_exact(s, 1)?;
            skip_sub_blocks(s)?;
            frame.skipped = true;
            return Ok(());
        }
        let s = self.stream_mut()?;
        frame.min_code_size = s.read_u8()?;
        let total = compute_chain_size(s)?;
        let mut data = Vec::with_capacity(total);
        let mut skipped_any = false;
        loop {
            let len = self.stream_mut()?.read_u8()?;
            if len == 0 {
                break;
            }
            if self.filtered(BlockEvent::ImageDataSub(len)) {
                skip_exact(self.stream_mut()?, len.into())?;
                skipped_any = true;
                continue;
            }
            let start = data.len();
            data.resize(start + usize::from(len), 0);
            self.stream_mut()?.read_exact(&mut data[start..])?;
        }
        if skipped_any {
            frame.skipped = true;
            return Ok(());
        }
        match self.decode_frame(frame, &data) {
            Ok(()) => Ok(()),
            Err(
                e @ (Error::MissingColorTable
                | Error::CorruptLzwStream
                | Error::InvalidCodeSize(_)),
            ) => {
                // frame-level failure; the reader continues past it
                frame.data = None;
                frame.error = Some(e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Decode collected image data into the frame's pixel buffer
    fn decode_frame(&self, frame: &mut Frame, data: &[u8]) -> Result<()> {
        if !(2..=8).contains(&frame.min_code_size) {
            return Err(Error::InvalidCodeSize(frame.min_code_size));
        }
        let colors = frame
            .local_color_table
            .as_deref()
            .or(self.metadata.global_color_table.as_deref())
            .ok_or(Error::MissingColorTable)?;
        let mut out = vec![0; frame.image_sz()];
        frame.trimmed = lzw::decompress(
            frame.min_code_size,
            colors,
            frame.transparent_color,
            data,
            &mut out,
        )?;
        frame.data = Some(if frame.interlaced {
            deinterlace(&out, frame.width.into(), frame.height.into())
        } else {
            out
        });
        Ok(())
    }
}

/// Iterator over the remaining frames of a [Reader].
///
/// Filtered frames are passed over; iteration ends at the trailer.
pub struct Frames<'a, R: Read + Seek> {
    reader: &'a mut Reader<R>,
}

impl<'a, R: Read + Seek> Iterator for Frames<'a, R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.next_frame() {
                Ok(Some(frame)) => return Some(Ok(frame)),
                Ok(None) => {
                    if self.reader.done || self.reader.stream.is_none() {
                        return None;
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Read a color table as ARGB entries with alpha 0xFF
fn read_color_table<R: Read + Seek>(
    s: &mut ByteStream<R>,
    len: usize,
) -> Result<Vec<u32>> {
    let mut buf = vec![0; len * CHANNELS];
    s.read_exact(&mut buf)?;
    Ok(buf
        .chunks_exact(CHANNELS)
        .map(|c| {
            0xFF00_0000
                | u32::from(c[0]) << 16
                | u32::from(c[1]) << 8
                | u32::from(c[2])
        })
        .collect())
}

/// Read a size byte that must be at least 1 and verify that many bytes
/// remain, leaving the stream right after the size byte
fn check_block_size<R: Read + Seek>(s: &mut ByteStream<R>) -> Result<u8> {
    let size = s.read_u8()?;
    if size == 0 {
        return Err(Error::EmptyBlockSize);
    }
    let saved = s.position()?;
    if s.skip(size.into())? != u64::from(size) {
        return Err(Error::UnexpectedEndOfStream);
    }
    s.seek_to(saved)?;
    Ok(size)
}

/// Skip exactly `n` bytes or fail
fn skip_exact<R: Read + Seek>(s: &mut ByteStream<R>, n: u64) -> Result<()> {
    if s.skip(n)? != n {
        return Err(Error::UnexpectedEndOfStream);
    }
    Ok(())
}

/// Read a sub-block chain, handing each payload to the callback
fn read_sub_blocks<R: Read + Seek>(
    s: &mut ByteStream<R>,
    mut f: impl FnMut(&[u8]),
) -> Result<usize> {
    let mut total = 0;
    loop {
        let len = usize::from(s.read_u8()?);
        if len == 0 {
            return Ok(total);
        }
        let mut buf = vec![0; len];
        s.read_exact(&mut buf)?;
        total += len;
        f(&buf);
    }
}

/// Advance past a sub-block chain
fn skip_sub_blocks<R: Read + Seek>(s: &mut ByteStream<R>) -> Result<()> {
    loop {
        let len = s.read_u8()?;
        if len == 0 {
            return Ok(());
        }
        skip_exact(s, len.into())?;
    }
}

/// Measure a sub-block chain without consuming it
fn compute_chain_size<R: Read + Seek>(
    s: &mut ByteStream<R>,
) -> Result<usize> {
    let saved = s.position()?;
    let mut total = 0;
    loop {
        let len = match s.read_u8() {
            Ok(len) => len,
            // sized tolerantly; the chain read reports the real error
            Err(_) => break,
        };
        if len == 0 {
            break;
        }
        total += s.skip(len.into())? as usize;
    }
    s.seek_to(saved)?;
    Ok(total)
}

/// Count image descriptors from position 0, skipping every payload.
///
/// Stops at the trailer, end of stream, or the first malformed block; the
/// count of descriptors seen so far stands either way.
fn scan_total_frames<R: Read + Seek>(s: &mut ByteStream<R>) -> usize {
    let mut count = 0;
    if scan_preamble(s).is_err() {
        return count;
    }
    loop {
        let b = match s.read_u8() {
            Ok(b) => b,
            Err(_) => break,
        };
        match BlockCode::from_u8(b) {
            Some(BlockCode::Extension_) => {
                if skip_extension_payload(s).is_err() {
                    break;
                }
            }
            Some(BlockCode::ImageDesc_) => {
                count += 1;
                if skip_image_payload(s).is_err() {
                    break;
                }
            }
            Some(BlockCode::Trailer_) | None => break,
        }
    }
    count
}

/// Skip the already-validated header, logical screen descriptor and global
/// color table
fn scan_preamble<R: Read + Seek>(s: &mut ByteStream<R>) -> Result<()> {
    skip_exact(s, 6)?;
    skip_exact(s, 4)?;
    let packed = s.read_u8()?;
    skip_exact(s, 2)?;
    if packed & Metadata::COLOR_TABLE_PRESENT != 0 {
        let len = 2 << u64::from(packed & Metadata::COLOR_TABLE_SIZE);
        skip_exact(s, len * CHANNELS as u64)?;
    }
    Ok(())
}

/// Skip one extension block's payload
fn skip_extension_payload<R: Read + Seek>(
    s: &mut ByteStream<R>,
) -> Result<()> {
    match ExtensionCode::from(s.read_u8()?) {
        // size byte + 4-byte payload + terminator
        ExtensionCode::GraphicControl_ => skip_exact(s, 6),
        ExtensionCode::Comment_ => skip_sub_blocks(s),
        ExtensionCode::PlainText_ => {
            // size byte + 12-byte grid
            skip_exact(s, 13)?;
            skip_sub_blocks(s)
        }
        ExtensionCode::Application_ => {
            // size byte + 8-byte identifier + 3-byte auth code
            skip_exact(s, 12)?;
            skip_sub_blocks(s)
        }
        ExtensionCode::Unknown_(_) => skip_sub_blocks(s),
    }
}

/// Skip one image's payload: descriptor, local color table and data
fn skip_image_payload<R: Read + Seek>(s: &mut ByteStream<R>) -> Result<()> {
    skip_exact(s, 8)?;
    let packed = s.read_u8()?;
    if packed & Frame::COLOR_TABLE_PRESENT != 0 {
        let len = 2 << u64::from(packed & Frame::COLOR_TABLE_SIZE);
        skip_exact(s, len * CHANNELS as u64)?;
    }
    skip_exact(s, 1)?;
    skip_sub_blocks(s)
}

#[cfg(test)]
mod test {
    use crate::block::{BlockEvent, DisposalMethod};
    use crate::{Decoder, Error};
    use std::io::Cursor;

    const WHITE: u32 = 0xFFFF_FFFF;
    const BLACK: u32 = 0xFF00_0000;
    const RED: u32 = 0xFFFF_0000;
    const BLUE: u32 = 0xFF00_00FF;

    /// 1x1 screen with a two-entry global color table (white, black)
    const SCREEN_1X1: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // GIF89a
        0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, // 1x1, 2-entry table
        0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, // white, black
    ];

    /// 1x1 image emitting color 0: clear, 0, end-of-information
    const IMAGE_1X1: &[u8] = &[
        0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
        0x02, 0x02, 0x44, 0x01, 0x00,
    ];

    const TRAILER: &[u8] = &[0x3B];

    fn gif(parts: &[&[u8]]) -> Cursor<Vec<u8>> {
        Cursor::new(parts.concat())
    }

    #[test]
    fn single_opaque_pixel() {
        let mut reader = Decoder::new(gif(&[SCREEN_1X1, IMAGE_1X1, TRAILER]))
            .open()
            .unwrap();
        assert_eq!(reader.total_frames(), 1);
        assert!(reader.has_remaining());
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!((frame.width, frame.height), (1, 1));
        assert_eq!(frame.data.as_deref(), Some(&[WHITE][..]));
        assert_eq!(frame.trimmed, 0);
        assert!(!reader.has_remaining());
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn second_table_entry() {
        // swapped table (black, white); the image emits code 1
        let screen = [
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00,
            0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
        ];
        let image = [
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
            0x02, 0x02, 0x4C, 0x01, 0x00,
        ];
        let mut reader = Decoder::new(gif(&[&screen, &image, TRAILER]))
            .open()
            .unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.data.as_deref(), Some(&[WHITE][..]));
    }

    #[test]
    fn graphic_control_defaults() {
        let gce = [0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut reader =
            Decoder::new(gif(&[SCREEN_1X1, &gce, IMAGE_1X1, TRAILER]))
                .open()
                .unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.disposal, DisposalMethod::NoAction);
        assert_eq!(frame.delay_cs, 0);
        assert_eq!(frame.transparent_color, None);
        assert_eq!(frame.data.as_deref(), Some(&[WHITE][..]));
    }

    #[test]
    fn transparent_pixel() {
        // transparency on, index 0: the emitted pixel decodes to ARGB 0
        let gce = [0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00];
        let mut reader =
            Decoder::new(gif(&[SCREEN_1X1, &gce, IMAGE_1X1, TRAILER]))
                .open()
                .unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.transparent_color, Some(0));
        assert_eq!(frame.data.as_deref(), Some(&[0u32][..]));
    }

    #[test]
    fn literal_codes_in_scan_order() {
        let screen = [
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x02, 0x00,
            0x81, 0x00, 0x00, // 2x2, 4-entry table
            0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00,
            0x00, 0xFF,
        ];
        let image = [
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00,
            0x02, 0x03, 0x44, 0x34, 0x05, 0x00,
        ];
        let mut reader = Decoder::new(gif(&[&screen, &image, TRAILER]))
            .open()
            .unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.data.as_deref(), Some(&[BLACK, WHITE, RED, BLUE][..]));
    }

    #[test]
    fn rendered_restore_to_background() {
        // screen 2x2 with table (red, blue); frame A covers the screen and
        // disposes to background, frame B draws one pixel at the origin
        let screen = [
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x02, 0x00,
            0x80, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF,
        ];
        let gce_a = [0x21, 0xF9, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00];
        let image_a = [
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00,
            0x02, 0x03, 0x04, 0x00, 0x05, 0x00,
        ];
        let mut reader = Decoder::new(gif(&[
            &screen, &gce_a, &image_a, IMAGE_1X1, TRAILER,
        ]))
        .rendered(true)
        .open()
        .unwrap();
        let a = reader.next_frame().unwrap().unwrap();
        assert_eq!((a.width, a.height), (2, 2));
        assert_eq!(a.data.as_deref(), Some(&[RED; 4][..]));
        let b = reader.next_frame().unwrap().unwrap();
        assert_eq!((b.width, b.height), (2, 2));
        assert_eq!(b.data.as_deref(), Some(&[RED, 0, 0, 0][..]));
    }

    #[test]
    fn filtered_image_data_consumes_index() {
        let mut reader = Decoder::new(gif(&[SCREEN_1X1, IMAGE_1X1, TRAILER]))
            .filter(Box::new(|ev| ev == BlockEvent::ImageData))
            .open()
            .unwrap();
        assert_eq!(reader.total_frames(), 1);
        assert!(reader.has_remaining());
        assert!(reader.next_frame().unwrap().is_none());
        assert!(!reader.has_remaining());
    }

    #[test]
    fn filtered_frames_are_invisible_to_iteration() {
        let mut reader = Decoder::new(gif(&[
            SCREEN_1X1, IMAGE_1X1, IMAGE_1X1, TRAILER,
        ]))
        .filter(Box::new(|ev| matches!(ev, BlockEvent::ImageDataSub(_))))
        .open()
        .unwrap();
        assert_eq!(reader.total_frames(), 2);
        let frames: Vec<_> = reader.frames().collect();
        assert!(frames.is_empty());
    }

    #[test]
    fn filtered_frame_still_consumes_its_index() {
        use std::cell::Cell;
        // skip only the first frame's image data
        let seen = Cell::new(false);
        let mut reader = Decoder::new(gif(&[
            SCREEN_1X1, IMAGE_1X1, IMAGE_1X1, TRAILER,
        ]))
        .filter(Box::new(move |ev| {
            ev == BlockEvent::ImageData && !seen.replace(true)
        }))
        .open()
        .unwrap();
        assert!(reader.next_frame().unwrap().is_none());
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.index, 1);
    }

    #[test]
    fn surplus_pixels_annotate_the_frame() {
        // a 1x1 descriptor, but the code stream emits four pixels
        let screen = [
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00,
            0x81, 0x00, 0x00, // 4-entry table
            0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00,
            0x00, 0xFF,
        ];
        let image = [
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
            0x02, 0x03, 0x44, 0x34, 0x05, 0x00,
        ];
        let mut reader = Decoder::new(gif(&[&screen, &image, TRAILER]))
            .open()
            .unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.data.as_deref(), Some(&[BLACK][..]));
        assert_eq!(frame.trimmed, 3);
        assert!(frame.error.is_none());
    }

    #[test]
    fn comments_and_loop_count() {
        let comment = [0x21, 0xFE, 0x02, b'h', b'i', 0x00];
        let netscape = [
            0x21, 0xFF, 0x0B, b'N', b'E', b'T', b'S', b'C', b'A', b'P',
            b'E', b'2', b'.', b'0', 0x03, 0x01, 0x02, 0x00, 0x00,
        ];
        let mut reader = Decoder::new(gif(&[
            SCREEN_1X1, &comment, &netscape, IMAGE_1X1, TRAILER,
        ]))
        .open()
        .unwrap();
        reader.next_frame().unwrap().unwrap();
        let m = reader.metadata();
        assert_eq!(m.version, *b"89a");
        assert_eq!((m.width, m.height), (1, 1));
        assert_eq!(m.comments, vec![b"hi".to_vec()]);
        assert_eq!(m.loop_count, 2);
    }

    #[test]
    fn plain_text_record() {
        let plain = [
            0x21, 0x01, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02,
            0x00, 0x08, 0x08, 0x01, 0x00, 0x02, b'o', b'k', 0x00,
        ];
        let mut reader =
            Decoder::new(gif(&[SCREEN_1X1, &plain, IMAGE_1X1, TRAILER]))
                .open()
                .unwrap();
        reader.next_frame().unwrap().unwrap();
        let pt = reader.metadata().plain_text.as_ref().unwrap();
        assert_eq!((pt.grid_width, pt.grid_height), (2, 2));
        assert_eq!(pt.foreground_color_index, 1);
        assert_eq!(pt.text, vec![b"ok".to_vec()]);
    }

    #[test]
    fn unknown_extension_is_skipped() {
        let ext = [0x21, 0xAB, 0x01, 0x00, 0x00];
        let mut reader =
            Decoder::new(gif(&[SCREEN_1X1, &ext, IMAGE_1X1, TRAILER]))
                .open()
                .unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.data.as_deref(), Some(&[WHITE][..]));
        // a filter that demands the subtype be consumed is an error
        let mut reader =
            Decoder::new(gif(&[SCREEN_1X1, &ext, IMAGE_1X1, TRAILER]))
                .filter(Box::new(|_| false))
                .open()
                .unwrap();
        assert!(matches!(
            reader.next_frame().unwrap_err(),
            Error::UnsupportedExtension(0xAB)
        ));
    }

    #[test]
    fn unknown_block_is_fatal() {
        let mut reader = Decoder::new(gif(&[SCREEN_1X1, &[0x99], TRAILER]))
            .open()
            .unwrap();
        assert!(matches!(
            reader.next_frame().unwrap_err(),
            Error::UnknownBlock(0x99)
        ));
        // the reader is closed; further calls yield nothing
        assert!(reader.next_frame().unwrap().is_none());
        assert!(!reader.has_remaining());
    }

    #[test]
    fn invalid_signature() {
        let res = Decoder::new(Cursor::new(b"NOTGIF".to_vec())).open();
        assert!(matches!(res.unwrap_err(), Error::InvalidSignature(_)));
        let res = Decoder::new(Cursor::new(vec![0x47])).open();
        assert!(matches!(res.unwrap_err(), Error::UnexpectedEndOfStream));
    }

    #[test]
    fn missing_color_table_annotates_frame() {
        let screen = [
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00,
            0x00, 0x00, 0x00,
        ];
        let mut reader = Decoder::new(gif(&[&screen, IMAGE_1X1, TRAILER]))
            .open()
            .unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert!(frame.data.is_none());
        assert!(matches!(frame.error, Some(Error::MissingColorTable)));
        // iteration continues to the trailer
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn interlaced_rows_are_reordered() {
        let screen = [
            0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x03, 0x00,
            0x81, 0x00, 0x00, // 1x3, 4-entry table
            0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00,
            0x00, 0xFF,
        ];
        // codes 0, 1, 2 in stream order; rows come back as 0, 2, 1
        let image = [
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x03, 0x00, 0x40,
            0x02, 0x02, 0x44, 0x54, 0x00,
        ];
        let mut reader = Decoder::new(gif(&[&screen, &image, TRAILER]))
            .open()
            .unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert!(frame.interlaced);
        assert_eq!(frame.data.as_deref(), Some(&[BLACK, RED, WHITE][..]));
    }

    #[test]
    fn local_table_overrides_global() {
        // frame 1 carries a local table (red, blue) and emits code 0
        let image_lct = [
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x80,
            0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x02, 0x02, 0x44, 0x01,
            0x00,
        ];
        let mut reader = Decoder::new(gif(&[
            SCREEN_1X1, IMAGE_1X1, &image_lct, TRAILER,
        ]))
        .open()
        .unwrap();
        assert_eq!(reader.total_frames(), 2);
        let a = reader.next_frame().unwrap().unwrap();
        assert_eq!(a.index, 0);
        assert_eq!(a.data.as_deref(), Some(&[WHITE][..]));
        let b = reader.next_frame().unwrap().unwrap();
        assert_eq!(b.index, 1);
        assert!(b.has_local_color_table());
        assert_eq!(b.data.as_deref(), Some(&[RED][..]));
    }

    #[test]
    fn decoding_twice_is_identical() {
        let bytes =
            [SCREEN_1X1, IMAGE_1X1, IMAGE_1X1, TRAILER].concat();
        let decode = || {
            let mut reader =
                Decoder::new(Cursor::new(bytes.clone())).open().unwrap();
            reader
                .frames()
                .map(|f| f.unwrap().data.unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(decode(), decode());
    }

    #[test]
    fn missing_trailer_ends_stream() {
        let mut reader =
            Decoder::new(gif(&[SCREEN_1X1, IMAGE_1X1])).open().unwrap();
        assert_eq!(reader.total_frames(), 1);
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.data.as_deref(), Some(&[WHITE][..]));
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let mut reader = Decoder::new(gif(&[SCREEN_1X1, IMAGE_1X1, TRAILER]))
            .open()
            .unwrap();
        reader.close();
        reader.close();
        assert!(!reader.has_remaining());
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn too_large_image_is_rejected() {
        let mut reader = Decoder::new(gif(&[SCREEN_1X1, IMAGE_1X1, TRAILER]))
            .max_image_sz(Some(2))
            .open()
            .unwrap();
        assert!(matches!(
            reader.next_frame().unwrap_err(),
            Error::TooLargeImage
        ));
    }
}
