//! Minimal raster graphics for small memory-mapped framebuffer displays.
//!
//! The crate draws into an in-memory pixel buffer ([`Surface`]) and,
//! optionally, into a framebuffer device mapped from the OS
//! ([`Screen`]). Two pixel formats are supported, 16-bit packed and
//! 32-bit (see [`PixelFormat`]); colors travel through the API as
//! 24-bit packed values built with [`color`]. Pre-rendered assets load
//! and store through a compact run-length-encoded grayscale format
//! ([`Surface::load`], [`Surface::store_grey`]).
//!
//! A screen is just a surface whose storage is device memory, so every
//! primitive — pixels, lines, boxes, blits, scaling, inversion — applies
//! to either target. Coordinates are trusted; only [`Surface::invert`]
//! and [`Surface::blit`] clip. The caller decides if and when to push an
//! in-memory surface onto a device with [`Surface::blit`].
//!
//! Surfaces are single-owner and not synchronized; callers sharing a
//! screen across threads must serialize access themselves.
//!
//! ```
//! use microfb::{color, PixelFormat, Surface};
//!
//! let mut page = Surface::new(128, 64, PixelFormat::Rgb16, None);
//! page.fill(color(0, 0, 0));
//! page.hline(10, 100, 20, color(255, 255, 255));
//!
//! // On Linux, push the page onto a mapped display the same way:
//! // let mut screen = microfb::Screen::open("/dev/fb0")?;
//! // screen.blit(&page, 0, 0);
//! ```

mod codec;
mod color;
mod store;
mod surface;

#[cfg(feature = "graphics")]
mod graphics;
#[cfg(target_os = "linux")]
mod screen;

pub use codec::DecodeError;
pub use color::{color, color16, color16_gray, PixelFormat};
pub use store::PixelStore;
pub use surface::{ReadbackUnsupported, Surface};

#[cfg(target_os = "linux")]
pub use screen::{FixScreenInfo, Mapping, Screen, ScreenError, VarScreenInfo};
