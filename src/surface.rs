//! The pixel surface and its drawing primitives.
//!
//! A [`Surface`] is a rectangular pixel buffer with a declared
//! [`PixelFormat`], a byte stride per row (which may exceed
//! `width * bytes_per_pixel` when the buffer is a sub-view of a larger
//! one, as with a mapped display), and a logical origin offset that
//! [`Surface::blit`] applies to its writes.
//!
//! Coordinates passed to the primitives are trusted: nothing but
//! [`Surface::invert`] clips, and an out-of-range coordinate panics on
//! the slice index rather than writing out of bounds. Callers are
//! expected to hand over already-computed, in-range geometry.

use thiserror::Error;

use crate::color::PixelFormat;
use crate::store::PixelStore;

/// Error returned by [`Surface::get_pixel`] on a surface whose format
/// does not support readback.
#[derive(Debug, Error)]
#[error("get_pixel requires a 4-byte-per-pixel surface (format is {format:?})")]
pub struct ReadbackUnsupported {
    /// The format of the surface the read was attempted on.
    pub format: PixelFormat,
}

/// An addressable rectangular pixel buffer.
#[derive(Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    format: PixelFormat,
    line_length: usize,
    x_offset: i32,
    y_offset: i32,
    store: PixelStore,
}

impl Surface {
    /// Create a surface of `width` x `height` pixels in `format`.
    ///
    /// When `data32` is given it must hold `width * height` pixels in
    /// 32-bit packed layout. For an [`Rgb32`](PixelFormat::Rgb32) target
    /// the pixels are copied verbatim; for [`Rgb16`](PixelFormat::Rgb16)
    /// each pixel is reduced through [`color16`](crate::color16). With
    /// no source data the buffer starts zeroed.
    pub fn new(width: u32, height: u32, format: PixelFormat, data32: Option<&[u8]>) -> Surface {
        let bypp = format.bytes_per_pixel();
        let line_length = width as usize * bypp;
        let mut buf = vec![0u8; line_length * height as usize];

        if let Some(data) = data32 {
            match format {
                PixelFormat::Rgb32 => {
                    let len = buf.len();
                    buf.copy_from_slice(&data[..len]);
                }
                PixelFormat::Rgb16 => {
                    for i in 0..(width as usize * height as usize) {
                        let s = 4 * i;
                        let c = u32::from_ne_bytes([
                            data[s],
                            data[s + 1],
                            data[s + 2],
                            data[s + 3],
                        ]);
                        let d = 2 * i;
                        format.write(&mut buf[d..d + 2], c);
                    }
                }
            }
        }

        Surface {
            width,
            height,
            format,
            line_length,
            x_offset: 0,
            y_offset: 0,
            store: PixelStore::Owned(buf),
        }
    }

    /// Deep-copy this surface into a new owned one.
    ///
    /// The copy keeps the source's stride but resets both origin offsets
    /// to zero.
    pub fn duplicate(&self) -> Surface {
        Surface {
            width: self.width,
            height: self.height,
            format: self.format,
            line_length: self.line_length,
            x_offset: 0,
            y_offset: 0,
            store: PixelStore::Owned(self.store.bytes().to_vec()),
        }
    }

    /// Assemble a surface over an existing store. Used by the screen
    /// binding, which brings its own mapped memory and device geometry.
    pub(crate) fn from_parts(
        width: u32,
        height: u32,
        format: PixelFormat,
        line_length: usize,
        x_offset: i32,
        y_offset: i32,
        store: PixelStore,
    ) -> Surface {
        Surface {
            width,
            height,
            format,
            line_length,
            x_offset,
            y_offset,
            store,
        }
    }

    /// Logical width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel storage format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Byte stride per row.
    pub fn line_length(&self) -> usize {
        self.line_length
    }

    /// Logical origin offset in pixels, applied by [`Surface::blit`].
    pub fn offsets(&self) -> (i32, i32) {
        (self.x_offset, self.y_offset)
    }

    /// The raw backing buffer.
    pub fn bytes(&self) -> &[u8] {
        self.store.bytes()
    }

    /// The raw backing buffer, mutably.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.store.bytes_mut()
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.line_length + x as usize * self.format.bytes_per_pixel()
    }

    /// Write one pixel of 24-bit color `c` at `(x, y)`.
    pub fn put_pixel(&mut self, x: i32, y: i32, c: u32) {
        let loc = self.index(x, y);
        let bypp = self.format.bytes_per_pixel();
        let format = self.format;
        format.write(&mut self.store.bytes_mut()[loc..loc + bypp], c);
    }

    /// Read back the pixel at `(x, y)` as a 24-bit packed color.
    ///
    /// Only supported on 4-byte surfaces; the 16-bit reduction is lossy
    /// and cannot be inverted.
    pub fn get_pixel(&self, x: i32, y: i32) -> Result<u32, ReadbackUnsupported> {
        if self.format != PixelFormat::Rgb32 {
            return Err(ReadbackUnsupported {
                format: self.format,
            });
        }
        let loc = self.index(x, y);
        Ok(self.format.read(&self.store.bytes()[loc..loc + 4]))
    }

    /// Rasterize a line from `(x1, y1)` to `(x2, y2)`.
    ///
    /// Steps along the dominant axis computing the other coordinate by
    /// integer interpolation. The end pixel on the dominant axis is
    /// exclusive. Endpoints given in decreasing order along the dominant
    /// axis swap once and recurse.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, c: u32) {
        if (x2 - x1).abs() > (y2 - y1).abs() {
            if x2 < x1 {
                self.line(x2, y2, x1, y1, c);
            } else {
                for x in x1..x2 {
                    let y = (y2 - y1) * (x - x1) / (x2 - x1) + y1;
                    self.put_pixel(x, y, c);
                }
            }
        } else if y2 < y1 {
            self.line(x2, y2, x1, y1, c);
        } else {
            for y in y1..y2 {
                let x = (x2 - x1) * (y - y1) / (y2 - y1) + x1;
                self.put_pixel(x, y, c);
            }
        }
    }

    /// Horizontal run of pixels from `x1` to `x2` inclusive at row `y`.
    pub fn hline(&mut self, x1: i32, x2: i32, y: i32, c: u32) {
        for x in x1..=x2 {
            self.put_pixel(x, y, c);
        }
    }

    /// Vertical run of pixels from `y1` to `y2` inclusive at column `x`.
    pub fn vline(&mut self, x: i32, y1: i32, y2: i32, c: u32) {
        for y in y1..=y2 {
            self.put_pixel(x, y, c);
        }
    }

    /// Filled rectangle over the inclusive coordinate range.
    pub fn box_fill(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, c: u32) {
        for y in y1..=y2 {
            self.hline(x1, x2, y, c);
        }
    }

    /// Fill the whole surface with one color.
    pub fn fill(&mut self, c: u32) {
        self.box_fill(0, 0, self.width as i32 - 1, self.height as i32 - 1, c);
    }

    /// Bitwise-complement every byte of every pixel in the rectangle.
    ///
    /// The only primitive that clips: the rectangle is clamped into the
    /// surface bounds first, so out-of-range corners are safe.
    pub fn invert(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let x1 = x1.max(0);
        let x2 = x2.min(self.width as i32 - 1);
        let y1 = y1.max(0);
        let y2 = y2.min(self.height as i32 - 1);

        let bypp = self.format.bytes_per_pixel();
        let line_length = self.line_length;
        let buf = self.store.bytes_mut();
        for y in y1..=y2 {
            for x in x1..=x2 {
                let loc = y as usize * line_length + x as usize * bypp;
                for b in &mut buf[loc..loc + bypp] {
                    *b = !*b;
                }
            }
        }
    }

    /// Copy `src` onto this surface with its top-left corner at
    /// `(xoff, yoff)` plus this surface's own origin offsets.
    ///
    /// The source rectangle is clipped against both surfaces: negative
    /// offsets drop leading source rows/columns, overlong extents drop
    /// trailing ones. A pixel-format mismatch is reported and the call
    /// copies nothing.
    pub fn blit(&mut self, src: &Surface, xoff: i32, yoff: i32) {
        if self.format != src.format {
            log::warn!(
                "cannot blit {:?} surface onto {:?} surface",
                src.format,
                self.format
            );
            return;
        }

        let bypp = self.format.bytes_per_pixel();
        let mut w = src.width as i32;
        let mut h = src.height as i32;
        let mut xoff = xoff;
        let mut yoff = yoff;
        let mut src_loc: isize = 0;

        if xoff < 0 {
            src_loc -= bypp as isize * xoff as isize;
            w += xoff;
            xoff = 0;
        }
        if yoff < 0 {
            src_loc -= src.line_length as isize * yoff as isize;
            h += yoff;
            yoff = 0;
        }
        if xoff + w > self.width as i32 {
            w = self.width as i32 - xoff;
        }
        if yoff + h > self.height as i32 {
            h = self.height as i32 - yoff;
        }
        if w <= 0 || h <= 0 {
            return;
        }

        let row = bypp * w as usize;
        let mut src_loc = src_loc as usize;
        let src_bytes = src.store.bytes();
        for y in 0..h {
            let dst = (xoff + self.x_offset) as usize * bypp
                + (y + yoff + self.y_offset) as usize * self.line_length;
            self.store.bytes_mut()[dst..dst + row]
                .copy_from_slice(&src_bytes[src_loc..src_loc + row]);
            src_loc += src.line_length;
        }
    }

    /// Integer upscale by nearest-neighbor replication.
    ///
    /// Every source pixel becomes a `factor` x `factor` block; the
    /// surface's geometry and stride scale accordingly and the old
    /// buffer is replaced by a new owned one. A factor of 1 is the
    /// identity.
    pub fn magnify(&mut self, factor: u32) {
        if factor <= 1 {
            return;
        }

        let bypp = self.format.bytes_per_pixel();
        let factor = factor as usize;
        let new_line_length = self.line_length * factor;
        let mut out = vec![0u8; new_line_length * self.height as usize * factor];

        let src = self.store.bytes();
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                let s = y * self.line_length + x * bypp;
                let px = &src[s..s + bypp];
                for dy in 0..factor {
                    let row = (y * factor + dy) * new_line_length + x * factor * bypp;
                    for dx in 0..factor {
                        let d = row + dx * bypp;
                        out[d..d + bypp].copy_from_slice(px);
                    }
                }
            }
        }

        self.width *= factor as u32;
        self.height *= factor as u32;
        self.line_length = new_line_length;
        self.store = PixelStore::Owned(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{color, color16};

    fn pixel16(s: &Surface, x: i32, y: i32) -> u16 {
        let loc = y as usize * s.line_length() + x as usize * 2;
        u16::from_ne_bytes([s.bytes()[loc], s.bytes()[loc + 1]])
    }

    #[test]
    fn put_and_get_pixel_rgb32() {
        let mut s = Surface::new(4, 4, PixelFormat::Rgb32, None);
        let c = color(10, 200, 30);
        s.put_pixel(2, 1, c);
        assert_eq!(s.get_pixel(2, 1).unwrap(), c);
        assert_eq!(s.get_pixel(0, 0).unwrap(), 0);
    }

    #[test]
    fn get_pixel_rejects_rgb16() {
        let s = Surface::new(4, 4, PixelFormat::Rgb16, None);
        assert!(s.get_pixel(0, 0).is_err());
    }

    #[test]
    fn rgb16_primitives_share_color16() {
        let c = color(0x12, 0x34, 0x56);
        let expected = color16(c);

        let mut s = Surface::new(4, 4, PixelFormat::Rgb16, None);
        s.put_pixel(0, 0, c);
        s.hline(1, 1, 0, c);
        s.vline(2, 0, 0, c);
        s.box_fill(3, 0, 3, 0, c);
        for x in 0..4 {
            assert_eq!(pixel16(&s, x, 0), expected);
        }
    }

    #[test]
    fn hline_sets_exactly_its_run() {
        let mut s = Surface::new(10, 10, PixelFormat::Rgb32, None);
        let c = color(1, 2, 3);
        s.hline(2, 6, 3, c);
        for y in 0..10 {
            for x in 0..10 {
                let expected = if y == 3 && (2..=6).contains(&x) { c } else { 0 };
                assert_eq!(s.get_pixel(x, y).unwrap(), expected, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn line_steps_dominant_axis_and_swaps() {
        let c = color(9, 9, 9);
        let mut s = Surface::new(8, 8, PixelFormat::Rgb32, None);
        s.line(0, 0, 5, 0, c);
        // Exclusive end on the dominant axis.
        for x in 0..5 {
            assert_eq!(s.get_pixel(x, 0).unwrap(), c);
        }
        assert_eq!(s.get_pixel(5, 0).unwrap(), 0);

        // Reversed endpoints draw the same pixels via the swap.
        let mut r = Surface::new(8, 8, PixelFormat::Rgb32, None);
        r.line(5, 0, 0, 0, c);
        assert_eq!(r.bytes(), s.bytes());
    }

    #[test]
    fn line_diagonal_interpolates() {
        let c = color(7, 7, 7);
        let mut s = Surface::new(8, 8, PixelFormat::Rgb32, None);
        s.line(0, 0, 4, 8, c);
        // y dominant: each step puts x = 4*y/8.
        for y in 0..8 {
            assert_eq!(s.get_pixel(4 * y / 8, y).unwrap(), c);
        }
    }

    #[test]
    fn fill_covers_surface() {
        let mut s = Surface::new(3, 3, PixelFormat::Rgb32, None);
        let c = color(4, 5, 6);
        s.fill(c);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(s.get_pixel(x, y).unwrap(), c);
            }
        }
    }

    #[test]
    fn invert_twice_restores_and_clamps() {
        let mut s = Surface::new(5, 5, PixelFormat::Rgb16, None);
        s.fill(color(10, 20, 30));
        let before = s.bytes().to_vec();

        // Rectangle extends well past the surface on every side.
        s.invert(-4, -4, 100, 100);
        assert_ne!(s.bytes(), &before[..]);
        s.invert(-4, -4, 100, 100);
        assert_eq!(s.bytes(), &before[..]);
    }

    #[test]
    fn invert_outside_bounds_is_a_no_op() {
        let mut s = Surface::new(5, 5, PixelFormat::Rgb32, None);
        let before = s.bytes().to_vec();
        s.invert(7, 7, 9, 9);
        assert_eq!(s.bytes(), &before[..]);
    }

    #[test]
    fn blit_clips_negative_offsets() {
        let mut src = Surface::new(10, 10, PixelFormat::Rgb32, None);
        for y in 0..10 {
            for x in 0..10 {
                src.put_pixel(x, y, color(x as u8, y as u8, 0));
            }
        }

        let mut dst = Surface::new(5, 5, PixelFormat::Rgb32, None);
        dst.blit(&src, -3, -3);

        // Destination (0,0) receives source (3,3) and so on.
        for y in 0..5 {
            for x in 0..5 {
                assert_eq!(
                    dst.get_pixel(x, y).unwrap(),
                    color((x + 3) as u8, (y + 3) as u8, 0),
                    "pixel ({x},{y})"
                );
            }
        }
    }

    #[test]
    fn blit_clips_overhang_and_applies_offsets() {
        let mut src = Surface::new(3, 3, PixelFormat::Rgb32, None);
        src.fill(color(1, 1, 1));

        let mut dst = Surface::new(5, 5, PixelFormat::Rgb32, None);
        dst.blit(&src, 4, 4);
        assert_eq!(dst.get_pixel(4, 4).unwrap(), color(1, 1, 1));
        assert_eq!(dst.get_pixel(3, 3).unwrap(), 0);
    }

    #[test]
    fn blit_applies_destination_origin_offsets() {
        let mut src = Surface::new(2, 2, PixelFormat::Rgb32, None);
        src.fill(color(9, 9, 9));

        // A destination panned to (1, 1), the way a screen reports it.
        let mut dst = Surface::from_parts(
            5,
            5,
            PixelFormat::Rgb32,
            5 * 4,
            1,
            1,
            PixelStore::Owned(vec![0u8; 5 * 4 * 5]),
        );
        assert_eq!(dst.offsets(), (1, 1));
        dst.blit(&src, 0, 0);

        // The copy lands shifted by the offsets; blit is the only
        // primitive that applies them.
        for y in 0..5 {
            for x in 0..5 {
                let expected = if (1..=2).contains(&x) && (1..=2).contains(&y) {
                    color(9, 9, 9)
                } else {
                    0
                };
                assert_eq!(dst.get_pixel(x, y).unwrap(), expected, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn blit_refuses_format_mismatch() {
        let src = Surface::new(3, 3, PixelFormat::Rgb16, None);
        let mut dst = Surface::new(5, 5, PixelFormat::Rgb32, None);
        let before = dst.bytes().to_vec();
        dst.blit(&src, 0, 0);
        assert_eq!(dst.bytes(), &before[..]);
    }

    #[test]
    fn blit_entirely_outside_copies_nothing() {
        let src = Surface::new(3, 3, PixelFormat::Rgb32, None);
        let mut dst = Surface::new(5, 5, PixelFormat::Rgb32, None);
        dst.blit(&src, 10, 10);
        dst.blit(&src, -10, -10);
        assert!(dst.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn magnify_one_is_identity() {
        let mut s = Surface::new(4, 4, PixelFormat::Rgb32, None);
        s.put_pixel(1, 2, color(5, 5, 5));
        let before = s.bytes().to_vec();
        s.magnify(1);
        assert_eq!(s.width(), 4);
        assert_eq!(s.bytes(), &before[..]);
    }

    #[test]
    fn magnify_replicates_blocks() {
        let mut s = Surface::new(2, 2, PixelFormat::Rgb32, None);
        let colors = [
            color(1, 0, 0),
            color(0, 1, 0),
            color(0, 0, 1),
            color(1, 1, 1),
        ];
        s.put_pixel(0, 0, colors[0]);
        s.put_pixel(1, 0, colors[1]);
        s.put_pixel(0, 1, colors[2]);
        s.put_pixel(1, 1, colors[3]);

        s.magnify(3);
        assert_eq!(s.width(), 6);
        assert_eq!(s.height(), 6);
        assert_eq!(s.line_length(), 6 * 4);

        for y in 0..6 {
            for x in 0..6 {
                let expected = colors[(y / 3 * 2 + x / 3) as usize];
                assert_eq!(s.get_pixel(x, y).unwrap(), expected, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn new_from_raw_data32() {
        let mut data = Vec::new();
        for i in 0..4u32 {
            data.extend_from_slice(&color(i as u8, 0, 0).to_ne_bytes());
        }

        let s = Surface::new(2, 2, PixelFormat::Rgb32, Some(&data));
        assert_eq!(s.get_pixel(1, 1).unwrap(), color(3, 0, 0));

        let s16 = Surface::new(2, 2, PixelFormat::Rgb16, Some(&data));
        assert_eq!(pixel16(&s16, 1, 1), color16(color(3, 0, 0)));
    }

    #[test]
    fn duplicate_resets_offsets_and_copies_bytes() {
        let mut s = Surface::new(4, 4, PixelFormat::Rgb16, None);
        s.fill(color(8, 8, 8));
        let d = s.duplicate();
        assert_eq!(d.offsets(), (0, 0));
        assert_eq!(d.line_length(), s.line_length());
        assert_eq!(d.bytes(), s.bytes());

        // Independent storage.
        s.fill(color(1, 1, 1));
        assert_ne!(d.bytes(), s.bytes());
    }
}
