// lib.rs      gifread crate
//
//! # gifread
//!
//! A library for decoding GIF87a / GIF89a images and animations into
//! fully-rendered 32-bit ARGB frames.
//!
//! The reader is pull-driven: frames are produced one at a time, so memory
//! use is bounded by the logical screen size plus one compressed-block
//! buffer, regardless of how many frames the file contains.  Malformed
//! streams are handled without unbounded allocation or out-of-bounds
//! indexing; an LZW stream that overruns its frame buffer is trimmed and
//! annotated rather than aborting the decode.
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod codes;
mod decode;
mod error;
mod input;
mod lzw;
mod private;
mod render;

pub use crate::decode::{BlockFilter, Frames, Reader};
pub use crate::error::{Error, Result};
pub use crate::private::Decoder;
