// lzw.rs
//
//! Lempel-Ziv-Welch decompression for GIF sub-images.
//!
//! The code table stores one fully-expanded ARGB pixel run per slot, so
//! decode time is linear in output pixels and a corrupt stream can never
//! trigger an unbounded parent-chain walk.
use crate::codes::{CodeReader, LsbCodeReader};
use crate::error::{Error, Result};

/// Number of code table slots
const TABLE_SIZE: usize = 4096;

/// Maximum code value
const MAX_CODE: u16 = 4095;

/// Maximum code width in bits
const MAX_CODE_BITS: u8 = 12;

/// Decompressor code table.
///
/// Slots `[0, n)` hold single-pixel runs drawn from the active color table;
/// the clear and end-of-information slots stay unpopulated (both are
/// intercepted before lookup); slots past end-of-information fill up as
/// entries are added.  An unpopulated slot read outside the
/// "not yet in table" case means the stream is corrupt.
struct CodeTable<'a> {
    /// Pixel run per slot; `None` marks an unpopulated slot
    entries: Vec<Option<Vec<u32>>>,
    /// Active color table (ARGB, alpha 0xFF)
    colors: &'a [u32],
    /// Transparent color index, when transparency is on
    transparent: Option<u8>,
    /// Clear code (2^min_code_size)
    clear_code: u16,
    /// End-of-information code
    eoi_code: u16,
    /// Next slot to fill
    next_code: u16,
}

impl<'a> CodeTable<'a> {
    /// Create a code table for one frame's decode
    fn new(min_code_size: u8, colors: &'a [u32], transparent: Option<u8>) -> Self {
        let clear_code = 1 << u16::from(min_code_size);
        CodeTable {
            entries: vec![None; TABLE_SIZE],
            colors,
            transparent,
            clear_code,
            eoi_code: clear_code + 1,
            next_code: clear_code + 2,
        }
    }

    /// Reinstate the post-initialize state and reset the reader's width.
    ///
    /// The slot vector is reused; no new table is allocated.
    fn reset(&mut self, reader: &mut dyn CodeReader) {
        for (slot, color) in self.entries.iter_mut().zip(self.colors) {
            match slot {
                Some(run) if run.len() == 1 => run[0] = *color,
                _ => *slot = Some(vec![*color]),
            }
        }
        // added entries only ever land past end-of-information
        for slot in &mut self.entries[usize::from(self.eoi_code) + 1..] {
            *slot = None;
        }
        // transparent pixels decode to ARGB 0
        if let Some(idx) = self.transparent {
            self.entries[usize::from(idx)] = Some(vec![0]);
        }
        self.next_code = self.eoi_code + 1;
        reader.reset_code_size();
    }

    /// Look up the pixel run of a populated slot
    fn get(&self, code: u16) -> Option<&[u32]> {
        self.entries
            .get(usize::from(code))
            .and_then(|e| e.as_deref())
    }

    /// Append a run at the next slot, growing the reader width when the
    /// slot being filled is the last code expressible at the current width.
    /// A full table drops the entry; codes then stay 12-bit until a CLEAR.
    fn add_entry(&mut self, entry: Vec<u32>, reader: &mut dyn CodeReader) {
        if self.next_code > MAX_CODE {
            return;
        }
        let max_value = (1 << u16::from(reader.code_size())) - 1;
        if self.next_code >= max_value && reader.code_size() < MAX_CODE_BITS {
            reader.grow_code_size();
        }
        self.entries[usize::from(self.next_code)] = Some(entry);
        self.next_code += 1;
    }
}

/// LZW decompressor for one frame's image data
struct Decompressor<'a> {
    /// Code table
    table: CodeTable<'a>,
    /// Output pixel buffer, exactly `width * height` long
    out: &'a mut [u32],
    /// Pixels written so far
    written: usize,
    /// Surplus pixels dropped past the end of `out`
    trimmed: usize,
}

impl<'a> Decompressor<'a> {
    /// Emit a pixel run, trimming at the end of the output buffer.
    ///
    /// Once the buffer is full, further emits only count dropped pixels.
    fn emit(&mut self, run: &[u32]) {
        let remaining = self.out.len() - self.written;
        if run.len() > remaining {
            if self.trimmed == 0 {
                warn!(
                    "output full: trimming {} of {} pixels",
                    run.len() - remaining,
                    run.len()
                );
            }
            self.out[self.written..].copy_from_slice(&run[..remaining]);
            self.written = self.out.len();
            self.trimmed += run.len() - remaining;
        } else {
            self.out[self.written..self.written + run.len()]
                .copy_from_slice(run);
            self.written += run.len();
        }
    }

    /// Look up a code and emit its run, returning the run's first pixel
    fn emit_code(&mut self, code: u16) -> Result<u32> {
        let run = self
            .table
            .get(code)
            .ok_or(Error::CorruptLzwStream)?
            .to_vec();
        self.emit(&run);
        Ok(run[0])
    }

    /// Decode the whole code stream
    fn decompress(&mut self, reader: &mut dyn CodeReader) -> Result<()> {
        let clear_code = self.table.clear_code;
        let eoi_code = self.table.eoi_code;
        self.table.reset(reader);
        if reader.exhausted() {
            return Ok(());
        }
        let mut code = reader.read();
        if code == clear_code {
            self.table.reset(reader);
            code = reader.read();
        }
        if code == eoi_code {
            return Ok(());
        }
        self.emit_code(code)?;
        loop {
            if reader.exhausted() {
                // truncated stream; keep the decodable prefix
                break;
            }
            let prev = code;
            code = reader.read();
            if code == clear_code {
                self.table.reset(reader);
                if reader.exhausted() {
                    break;
                }
                code = reader.read();
                if code == eoi_code {
                    break;
                }
                self.emit_code(code)?;
                continue;
            }
            if code == eoi_code {
                break;
            }
            if self.table.get(code).is_some() {
                let first = self.emit_code(code)?;
                let mut entry = self
                    .table
                    .get(prev)
                    .ok_or(Error::CorruptLzwStream)?
                    .to_vec();
                entry.push(first);
                self.table.add_entry(entry, reader);
            } else if code == self.table.next_code {
                // code not yet in table: prev run plus its own first pixel
                let mut entry = self
                    .table
                    .get(prev)
                    .ok_or(Error::CorruptLzwStream)?
                    .to_vec();
                entry.push(entry[0]);
                self.emit(&entry);
                self.table.add_entry(entry, reader);
            } else {
                return Err(Error::CorruptLzwStream);
            }
        }
        Ok(())
    }
}

/// Decompress one frame's image data into a pre-sized pixel buffer.
///
/// `out` must hold exactly `width * height` values.  Returns the number of
/// surplus pixels the stream produced past the end of `out` (0 for a
/// well-formed stream).
pub(crate) fn decompress(
    min_code_size: u8,
    colors: &[u32],
    transparent: Option<u8>,
    data: &[u8],
    out: &mut [u32],
) -> Result<usize> {
    debug!(
        "lzw: min code size {}, clear {}, colors {}",
        min_code_size,
        1 << u16::from(min_code_size),
        colors.len()
    );
    let mut reader = LsbCodeReader::new(data, min_code_size);
    let mut dec = Decompressor {
        table: CodeTable::new(min_code_size, colors, transparent),
        out,
        written: 0,
        trimmed: 0,
    };
    dec.decompress(&mut reader)?;
    Ok(dec.trimmed)
}
