//! Color packing for the two supported pixel formats.
//!
//! Colors travel through the API as a 24-bit value packed
//! `(r << 16) | (g << 8) | b`. Surfaces with 2 bytes per pixel reduce
//! that value to a packed 16-bit layout on every write; 4-byte surfaces
//! store it verbatim in native byte order, which on little-endian
//! targets gives the `[B, G, R, pad]` row layout the display drivers
//! expect.

/// Pack 8-bit RGB channels into a 24-bit color value.
pub fn color(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Reduce a 24-bit color to the packed 16-bit layout used by 2-byte
/// surfaces.
///
/// The bit selection is fixed and deliberately matches the wire format
/// of the panels this crate targets; every 2-byte primitive funnels
/// through this one function.
pub fn color16(c: u32) -> u16 {
    (((c & 0x0000_00fc) << 11) | ((c & 0x0000_fd00) >> 3) | ((c & 0x00fc_0000) >> 16)) as u16
}

/// 16-bit packing of a single grayscale sample, replicated into all
/// three channel positions.
pub fn color16_gray(v: u8) -> u16 {
    let c = (v & 0xfc) as u32;
    ((c << 11) | (c << 5) | c) as u16
}

/// Pixel storage format of a [`Surface`](crate::Surface).
///
/// Selected once at construction; all drawing primitives dispatch on it
/// through [`PixelFormat::write`] and [`PixelFormat::read`] so the
/// packing math lives in one place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Two bytes per pixel, packed 16-bit color (see [`color16`]).
    Rgb16,
    /// Four bytes per pixel, 24-bit color stored in native byte order.
    Rgb32,
}

impl PixelFormat {
    /// Width of one stored pixel in bytes.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb16 => 2,
            PixelFormat::Rgb32 => 4,
        }
    }

    /// Map a declared byte width (2 or 4) back to a format.
    pub fn from_bytes_per_pixel(bypp: u16) -> Option<Self> {
        match bypp {
            2 => Some(PixelFormat::Rgb16),
            4 => Some(PixelFormat::Rgb32),
            _ => None,
        }
    }

    /// Write one pixel of 24-bit color `c` at the start of `dst`.
    pub(crate) fn write(self, dst: &mut [u8], c: u32) {
        match self {
            PixelFormat::Rgb16 => dst[..2].copy_from_slice(&color16(c).to_ne_bytes()),
            PixelFormat::Rgb32 => dst[..4].copy_from_slice(&c.to_ne_bytes()),
        }
    }

    /// Read back one stored pixel from the start of `src`.
    pub(crate) fn read(self, src: &[u8]) -> u32 {
        match self {
            PixelFormat::Rgb16 => u16::from_ne_bytes([src[0], src[1]]) as u32,
            PixelFormat::Rgb32 => u32::from_ne_bytes([src[0], src[1], src[2], src[3]]),
        }
    }
}
