//! Run-length-encoded grayscale image codec.
//!
//! The on-disk format is a fixed 8-byte header followed by run pairs:
//!
//! ```text
//! offset 0: u16 width          (little-endian)
//! offset 2: u16 height
//! offset 4: u16 bytes per pixel (in-memory format produced on decode)
//! offset 6: u16 color mode      (must be 1 = grayscale)
//! offset 8: (run: u8, value: u8) pairs until width*height samples
//! ```
//!
//! Encoding reduces the surface to one grayscale byte per pixel (a
//! single channel, the others are ignored) and emits maximal runs of up
//! to 255 samples. Decoding expands each sample back into the declared
//! pixel format, so decode(encode(s)) reproduces the grayscale channel
//! exactly.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::color::{color16_gray, PixelFormat};
use crate::surface::Surface;

/// Color mode tag for grayscale, the only mode the codec supports.
const COLOR_MODE_GRAY: u16 = 1;

/// Errors produced while decoding an RLE grayscale image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Reading the header or run data failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The file declares a color mode other than grayscale.
    #[error("unsupported color mode {0} (only grayscale is supported)")]
    ColorMode(u16),
    /// The file declares a pixel size other than 2 or 4 bytes.
    #[error("unsupported pixel size {0}")]
    PixelSize(u16),
    /// The run stream ended before producing every sample.
    #[error("run data ended after {produced} of {expected} samples")]
    Truncated {
        /// Samples recovered before the stream ended.
        produced: usize,
        /// Samples the header promised.
        expected: usize,
    },
}

fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn decode<R: Read>(reader: &mut R) -> Result<Surface, DecodeError> {
    let width = read_u16(reader)?;
    let height = read_u16(reader)?;
    let pixel_size = read_u16(reader)?;
    let color_mode = read_u16(reader)?;

    if color_mode != COLOR_MODE_GRAY {
        return Err(DecodeError::ColorMode(color_mode));
    }
    let format =
        PixelFormat::from_bytes_per_pixel(pixel_size).ok_or(DecodeError::PixelSize(pixel_size))?;

    let expected = width as usize * height as usize;
    let mut gray = vec![0u8; expected];
    let mut produced = 0;
    while produced < expected {
        let mut pair = [0u8; 2];
        match reader.read_exact(&mut pair) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(DecodeError::Truncated { produced, expected });
            }
            Err(e) => return Err(DecodeError::Io(e)),
        }
        let (run, value) = (pair[0] as usize, pair[1]);
        let n = run.min(expected - produced);
        gray[produced..produced + n].fill(value);
        produced += n;
    }

    let mut surface = Surface::new(width as u32, height as u32, format, None);
    let bytes = surface.bytes_mut();
    match format {
        PixelFormat::Rgb16 => {
            for (i, &g) in gray.iter().enumerate() {
                bytes[2 * i..2 * i + 2].copy_from_slice(&color16_gray(g).to_ne_bytes());
            }
        }
        PixelFormat::Rgb32 => {
            // Replicate the sample into the three color channels, pad
            // byte stays zero.
            for (i, &g) in gray.iter().enumerate() {
                bytes[4 * i..4 * i + 3].fill(g);
            }
        }
    }

    Ok(surface)
}

pub(crate) fn encode<W: Write>(surface: &Surface, writer: &mut W) -> io::Result<()> {
    let width = surface.width() as usize;
    let height = surface.height() as usize;
    let bypp = surface.format().bytes_per_pixel();

    writer.write_all(&(width as u16).to_le_bytes())?;
    writer.write_all(&(height as u16).to_le_bytes())?;
    writer.write_all(&(bypp as u16).to_le_bytes())?;
    writer.write_all(&COLOR_MODE_GRAY.to_le_bytes())?;

    // One channel per pixel: the low byte of the packed 16-bit value
    // (masked to its stored precision), or the first channel byte of a
    // 32-bit pixel.
    let bytes = surface.bytes();
    let gray: Vec<u8> = (0..width * height)
        .map(|i| match surface.format() {
            PixelFormat::Rgb16 => bytes[2 * i] & 0xfc,
            PixelFormat::Rgb32 => bytes[4 * i],
        })
        .collect();

    let mut last = 0u8;
    let mut run = 0u8;
    for &g in &gray {
        if g == last {
            if run == 255 {
                writer.write_all(&[run, last])?;
                run = 0;
            }
            run += 1;
        } else {
            if run > 0 {
                writer.write_all(&[run, last])?;
            }
            last = g;
            run = 1;
        }
    }
    writer.write_all(&[run, last])?;
    Ok(())
}

impl Surface {
    /// Decode an RLE grayscale image from `reader`.
    pub fn decode_grey<R: Read>(reader: &mut R) -> Result<Surface, DecodeError> {
        decode(reader)
    }

    /// Decode an RLE grayscale image file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Surface, DecodeError> {
        let mut reader = BufReader::new(File::open(path)?);
        decode(&mut reader)
    }

    /// Encode this surface's grayscale channel to `writer`.
    pub fn encode_grey<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        encode(self, writer)
    }

    /// Encode this surface's grayscale channel into a file that
    /// [`Surface::load`] reads back.
    pub fn store_grey<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        encode(self, &mut writer)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::color;
    use std::io::Cursor;

    fn decode_bytes(data: &[u8]) -> Result<Surface, DecodeError> {
        decode(&mut Cursor::new(data))
    }

    fn header(width: u16, height: u16, bypp: u16, mode: u16) -> Vec<u8> {
        let mut out = Vec::new();
        for v in [width, height, bypp, mode] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    #[test]
    fn round_trip_rgb32() {
        let mut s = Surface::new(6, 4, PixelFormat::Rgb32, None);
        for y in 0..4 {
            for x in 0..6 {
                // Gray ramp in the channel store_grey samples.
                let g = (x * 7 + y * 13) as u8;
                s.put_pixel(x, y, color(0, 0, g));
            }
        }

        let mut encoded = Vec::new();
        s.encode_grey(&mut encoded).unwrap();
        let d = decode_bytes(&encoded).unwrap();

        assert_eq!(d.width(), 6);
        assert_eq!(d.height(), 4);
        assert_eq!(d.format(), PixelFormat::Rgb32);
        for i in 0..24 {
            assert_eq!(d.bytes()[4 * i], s.bytes()[4 * i], "sample {i}");
        }
    }

    #[test]
    fn round_trip_rgb16() {
        let mut s = Surface::new(5, 5, PixelFormat::Rgb16, None);
        for y in 0..5 {
            let g = (y * 40) as u8;
            s.hline(0, 4, y, color(g, g, g));
        }

        let mut encoded = Vec::new();
        s.encode_grey(&mut encoded).unwrap();
        let d = decode_bytes(&encoded).unwrap();

        assert_eq!(d.format(), PixelFormat::Rgb16);
        // The sampled channel survives to its stored precision.
        for i in 0..25 {
            assert_eq!(d.bytes()[2 * i] & 0xfc, s.bytes()[2 * i] & 0xfc, "sample {i}");
        }
    }

    #[test]
    fn long_runs_split_at_255() {
        let s = Surface::new(32, 32, PixelFormat::Rgb32, None);
        let mut encoded = Vec::new();
        s.encode_grey(&mut encoded).unwrap();

        // 1024 zero samples: four 255-runs and a final run of 4.
        assert_eq!(
            &encoded[8..],
            &[255, 0, 255, 0, 255, 0, 255, 0, 4, 0][..]
        );
        let d = decode_bytes(&encoded).unwrap();
        assert!(d.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn rejects_non_grayscale_color_mode() {
        let mut data = header(2, 2, 4, 2);
        data.extend_from_slice(&[4, 0]);
        assert!(matches!(
            decode_bytes(&data),
            Err(DecodeError::ColorMode(2))
        ));
    }

    #[test]
    fn rejects_unknown_pixel_size() {
        let data = header(2, 2, 3, 1);
        assert!(matches!(decode_bytes(&data), Err(DecodeError::PixelSize(3))));
    }

    #[test]
    fn truncated_run_stream_is_an_error() {
        let mut data = header(4, 4, 4, 1);
        data.extend_from_slice(&[8, 0x55]); // 8 of 16 samples
        assert!(matches!(
            decode_bytes(&data),
            Err(DecodeError::Truncated {
                produced: 8,
                expected: 16,
            })
        ));
    }

    #[test]
    fn truncated_header_is_an_io_error() {
        assert!(matches!(
            decode_bytes(&[1, 0, 1, 0]),
            Err(DecodeError::Io(_))
        ));
    }

    #[test]
    fn decode_expands_gray_into_rgb16() {
        let mut data = header(2, 1, 2, 1);
        data.extend_from_slice(&[2, 0x80]);
        let d = decode_bytes(&data).unwrap();
        let expected = crate::color::color16_gray(0x80).to_ne_bytes();
        assert_eq!(&d.bytes()[..2], &expected);
        assert_eq!(&d.bytes()[2..4], &expected);
    }

    #[test]
    fn zero_runs_are_skipped() {
        let mut data = header(2, 1, 4, 1);
        data.extend_from_slice(&[0, 0xff, 2, 0x10]);
        let d = decode_bytes(&data).unwrap();
        assert_eq!(d.bytes()[0], 0x10);
        assert_eq!(d.bytes()[4], 0x10);
    }
}
