// render.rs
//
//! Interlace reordering and disposal-aware frame composition.
use crate::block::{DisposalMethod, Frame};

/// Reorder the rows of an interlaced sub-image into display order.
///
/// Interlaced images store their rows in four passes: every 8th row from 0,
/// every 8th row from 4, every 4th row from 2, then every 2nd row from 1.
pub(crate) fn deinterlace(src: &[u32], width: usize, height: usize) -> Vec<u32> {
    if width == 0 || height == 0 {
        return src.to_vec();
    }
    let mut dest = vec![0; src.len()];
    let mut src_rows = src.chunks_exact(width);
    for (offset, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        let mut row = offset;
        while row < height {
            match src_rows.next() {
                Some(s) => {
                    dest[row * width..(row + 1) * width].copy_from_slice(s)
                }
                None => return dest,
            }
            row += step;
        }
    }
    dest
}

/// Composes sub-images onto a logical-screen-sized canvas, honoring each
/// frame's disposal method and transparency.
pub(crate) struct Compositor {
    /// Logical screen width
    width: usize,
    /// Logical screen height
    height: usize,
    /// Current canvas
    canvas: Vec<u32>,
    /// Canvas snapshot for restore-to-previous
    previous: Vec<u32>,
    /// Prior frame's disposal method and sub-rectangle
    prior: Option<(DisposalMethod, usize, usize, usize, usize)>,
}

impl Compositor {
    /// Create a compositor for the given logical screen
    pub fn new(width: u16, height: u16) -> Self {
        let sz = usize::from(width) * usize::from(height);
        Compositor {
            width: width.into(),
            height: height.into(),
            canvas: vec![0; sz],
            previous: vec![0; sz],
            prior: None,
        }
    }

    /// Compose one decoded (and already deinterlaced) sub-image and return
    /// a copy of the rendered canvas.
    pub fn compose(&mut self, frame: &Frame, pixels: &[u32]) -> Vec<u32> {
        self.dispose_prior();
        if frame.disposal == DisposalMethod::Previous {
            self.previous.copy_from_slice(&self.canvas);
        }
        let (left, top) = (usize::from(frame.left), usize::from(frame.top));
        let (w, h) = (usize::from(frame.width), usize::from(frame.height));
        self.blit(left, top, w, h, pixels);
        self.prior = Some((frame.disposal, left, top, w, h));
        self.canvas.clone()
    }

    /// Apply the prior frame's disposal method to its sub-rectangle
    fn dispose_prior(&mut self) {
        let (disposal, left, top, w, h) = match self.prior.take() {
            Some(prior) => prior,
            None => return,
        };
        match disposal {
            DisposalMethod::Background => {
                for (_, row) in self.rows(left, top, w, h) {
                    self.canvas[row].fill(0);
                }
            }
            DisposalMethod::Previous => {
                for (_, row) in self.rows(left, top, w, h) {
                    self.canvas[row.clone()]
                        .copy_from_slice(&self.previous[row]);
                }
            }
            _ => (),
        }
    }

    /// Write a sub-image at (left, top); transparent source pixels leave
    /// the destination untouched.
    fn blit(&mut self, left: usize, top: usize, w: usize, h: usize, pixels: &[u32]) {
        for (y, row) in self.rows(left, top, w, h) {
            let src = &pixels[y * w..y * w + row.len()];
            for (dst, px) in self.canvas[row].iter_mut().zip(src) {
                if px >> 24 != 0 {
                    *dst = *px;
                }
            }
        }
    }

    /// Collect canvas index ranges of a sub-rectangle, clipped to the
    /// logical screen
    fn rows(
        &self,
        left: usize,
        top: usize,
        w: usize,
        h: usize,
    ) -> Vec<(usize, std::ops::Range<usize>)> {
        let span = w.min(self.width.saturating_sub(left));
        (0..h)
            .take(self.height.saturating_sub(top))
            .map(|y| {
                let start = (top + y) * self.width + left;
                (y, start..start + span)
            })
            .collect()
    }
}
