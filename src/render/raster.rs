//! In-memory RGBA preview of a single page.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Pixel, Rgba, RgbaImage};

use super::{Surface, SurfaceError, SurfaceTarget};
use crate::color::Color;
use crate::page::{PX_PER_INCH, PageSpec};
use crate::placement::{Frame, Placement};

/// Raster canvas showing one page of a sheet.
///
/// Sized to the page at a fixed density (96 px per page unit by default).
/// Images are resized to their cell and composited over the background.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    canvas: RgbaImage,
    density: f64,
    page_index: usize,
}

impl RasterSurface {
    /// Canvas for page 0 at [`PX_PER_INCH`].
    pub fn new(page: &PageSpec) -> Self {
        Self::with_density(page, PX_PER_INCH)
    }

    /// Canvas at `density` pixels per page unit.
    pub fn with_density(page: &PageSpec, density: f64) -> Self {
        let (w, h) = page.scaled_dimensions(density);
        Self {
            canvas: RgbaImage::new(to_pixels(w).max(1), to_pixels(h).max(1)),
            density,
            page_index: 0,
        }
    }

    /// Show another page of the sheet.
    pub fn page(mut self, page_index: usize) -> Self {
        self.page_index = page_index;
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    /// Pixel bounds `(x0, y0, x1, y1)` of a frame, clamped to the canvas.
    fn pixel_bounds(&self, frame: Frame) -> (u32, u32, u32, u32) {
        let scaled = frame.scaled(self.density);
        let clamp_x = |v: f64| to_pixels(v).min(self.canvas.width());
        let clamp_y = |v: f64| to_pixels(v).min(self.canvas.height());
        (
            clamp_x(scaled.x),
            clamp_y(scaled.y),
            clamp_x(scaled.right()),
            clamp_y(scaled.bottom()),
        )
    }

    fn plot(&mut self, x: f64, y: f64, color: Rgba<u8>) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let (px, py) = (x.round() as u32, y.round() as u32);
        if px < self.canvas.width() && py < self.canvas.height() {
            self.canvas.get_pixel_mut(px, py).blend(&color);
        }
    }
}

/// Round to whole pixels; negative and NaN become 0.
fn to_pixels(v: f64) -> u32 {
    v.round().max(0.0) as u32
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

impl Surface for RasterSurface {
    fn target(&self) -> SurfaceTarget {
        SurfaceTarget::SinglePage(self.page_index)
    }

    fn begin_page(&mut self, _page_index: usize, _page: &PageSpec) -> Result<(), SurfaceError> {
        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        Ok(())
    }

    fn fill_rect(&mut self, frame: Frame, color: Color) -> Result<(), SurfaceError> {
        let (x0, y0, x1, y1) = self.pixel_bounds(frame);
        let color = rgba(color);
        for y in y0..y1 {
            for x in x0..x1 {
                self.canvas.get_pixel_mut(x, y).blend(&color);
            }
        }
        Ok(())
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) -> Result<(), SurfaceError> {
        let (x0, y0) = (from.0 * self.density, from.1 * self.density);
        let (dx, dy) = (to.0 * self.density - x0, to.1 * self.density - y0);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        let color = rgba(color);
        for i in 0..=steps {
            let t = f64::from(i) / f64::from(steps);
            self.plot(x0 + dx * t, y0 + dy * t, color);
        }
        Ok(())
    }

    fn draw_image(&mut self, placement: &Placement, image: &DynamicImage) -> Result<(), SurfaceError> {
        let (x0, y0, x1, y1) = self.pixel_bounds(placement.frame);
        if x1 <= x0 || y1 <= y0 {
            return Ok(());
        }
        let resized = imageops::resize(image, x1 - x0, y1 - y0, FilterType::Triangle);
        imageops::overlay(&mut self.canvas, &resized, i64::from(x0), i64::from(y0));
        Ok(())
    }
}
