//! embedded-graphics support.
//!
//! With the `graphics` feature a [`Surface`] is a
//! [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget) for
//! [`Rgb888`] colors, so toolkits built on embedded-graphics can draw
//! straight into it (and, through `DerefMut`, into a
//! [`Screen`](crate::Screen)). Out-of-range pixels from styled
//! primitives are clipped here; the raw surface primitives stay
//! unchecked.

use core::convert::Infallible;

use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::{Rgb888, RgbColor},
    Pixel,
};

use crate::color::color;
use crate::surface::Surface;

impl OriginDimensions for Surface {
    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

impl DrawTarget for Surface {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = (self.width() as i32, self.height() as i32);
        for Pixel(point, c) in pixels {
            if point.x >= 0 && point.y >= 0 && point.x < width && point.y < height {
                self.put_pixel(point.x, point.y, color(c.r(), c.g(), c.b()));
            }
        }
        Ok(())
    }
}
