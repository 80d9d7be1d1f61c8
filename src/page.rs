//! Physical page description: size, orientation, decorations, units.

use crate::color::Color;
use crate::layout::LayoutError;

/// Raster preview density: pixels per inch.
pub const PX_PER_INCH: f64 = 96.0;

/// PDF user-space density: points per inch.
pub const PT_PER_INCH: f64 = 72.0;

/// Which axis of the paper runs horizontally.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Orientation {
    /// Short side horizontal.
    #[default]
    Portrait,
    /// Long side horizontal.
    Landscape,
}

/// Common paper presets, dimensions in inches (short side first).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PaperSize {
    /// ISO A4, 8.27" × 11.69".
    A4,
    /// US Letter, 8.5" × 11".
    Letter,
    /// US Legal, 8.5" × 14".
    Legal,
}

impl PaperSize {
    /// `(short, long)` side lengths in inches.
    pub const fn inches(self) -> (f64, f64) {
        match self {
            Self::A4 => (8.27, 11.69),
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
        }
    }
}

/// A sheet of paper the images are laid out on.
///
/// Width and height are in one linear unit (inches throughout this crate).
/// [`orientation`](Self::orientation) decides which of the two runs
/// horizontally, so `PageSpec::new(8.27, 11.69)` and
/// `PageSpec::new(11.69, 8.27)` describe the same portrait page.
///
/// ```
/// use snapsheet::{Orientation, PageSpec, PaperSize};
///
/// let page = PageSpec::paper(PaperSize::Letter, Orientation::Landscape);
/// assert_eq!(page.dimensions(), (11.0, 8.5));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageSpec {
    /// One side of the paper.
    pub width: f64,
    /// The other side of the paper.
    pub height: f64,
    pub orientation: Orientation,
    /// Painted under every page before any image.
    pub background: Color,
    /// Outline every grid cell before images are drawn.
    pub show_grid_lines: bool,
    pub grid_line_color: Color,
}

impl PageSpec {
    /// Portrait page, white background, no grid lines.
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            orientation: Orientation::Portrait,
            background: Color::WHITE,
            show_grid_lines: false,
            grid_line_color: Color::LIGHT_GRAY,
        }
    }

    /// Page from a paper preset.
    pub const fn paper(size: PaperSize, orientation: Orientation) -> Self {
        let (short, long) = size.inches();
        let mut page = Self::new(short, long);
        page.orientation = orientation;
        page
    }

    /// Set the orientation.
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the background color.
    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Toggle cell outlines.
    pub fn grid_lines(mut self, show: bool) -> Self {
        self.show_grid_lines = show;
        self
    }

    /// Set the cell outline color.
    pub fn grid_line_color(mut self, color: Color) -> Self {
        self.grid_line_color = color;
        self
    }

    /// Oriented `(width, height)`: portrait puts the shorter side first.
    pub fn dimensions(&self) -> (f64, f64) {
        let (short, long) = if self.width <= self.height {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        match self.orientation {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        }
    }

    /// Oriented dimensions multiplied by `units_per_unit` (e.g. [`PX_PER_INCH`]).
    pub fn scaled_dimensions(&self, units_per_unit: f64) -> (f64, f64) {
        let (w, h) = self.dimensions();
        (w * units_per_unit, h * units_per_unit)
    }

    /// Both sides must be finite and positive.
    pub fn validate(&self) -> Result<(), LayoutError> {
        positive("page.width", self.width)?;
        positive("page.height", self.height)
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), LayoutError> {
    if !value.is_finite() {
        return Err(LayoutError::InvalidParameter {
            field,
            reason: "must be finite",
        });
    }
    if value <= 0.0 {
        return Err(LayoutError::InvalidParameter {
            field,
            reason: "must be greater than zero",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_swaps_axes() {
        let portrait = PageSpec::paper(PaperSize::A4, Orientation::Portrait);
        assert_eq!(portrait.dimensions(), (8.27, 11.69));
        let landscape = portrait.orientation(Orientation::Landscape);
        assert_eq!(landscape.dimensions(), (11.69, 8.27));
    }

    #[test]
    fn dimensions_ignore_argument_order() {
        assert_eq!(PageSpec::new(11.0, 8.5).dimensions(), (8.5, 11.0));
        assert_eq!(
            PageSpec::new(8.5, 11.0)
                .orientation(Orientation::Landscape)
                .dimensions(),
            (11.0, 8.5)
        );
    }

    #[test]
    fn presets() {
        assert_eq!(PaperSize::Letter.inches(), (8.5, 11.0));
        assert_eq!(PaperSize::Legal.inches(), (8.5, 14.0));
        let legal = PageSpec::paper(PaperSize::Legal, Orientation::Portrait);
        assert_eq!(legal.dimensions(), (8.5, 14.0));
    }

    #[test]
    fn scaled_to_preview_pixels() {
        let (w, h) = PageSpec::new(2.0, 3.0).scaled_dimensions(PX_PER_INCH);
        assert_eq!((w, h), (192.0, 288.0));
    }

    #[test]
    fn builder_sets_decorations() {
        let page = PageSpec::new(8.5, 11.0)
            .background(Color::BLACK)
            .grid_lines(true)
            .grid_line_color(Color::rgb(1, 2, 3));
        assert_eq!(page.background, Color::BLACK);
        assert!(page.show_grid_lines);
        assert_eq!(page.grid_line_color, Color::rgb(1, 2, 3));
    }

    #[test]
    fn validation_names_the_field() {
        assert_eq!(
            PageSpec::new(0.0, 11.0).validate(),
            Err(LayoutError::InvalidParameter {
                field: "page.width",
                reason: "must be greater than zero",
            })
        );
        assert_eq!(
            PageSpec::new(8.5, f64::NAN).validate(),
            Err(LayoutError::InvalidParameter {
                field: "page.height",
                reason: "must be finite",
            })
        );
        assert_eq!(
            PageSpec::new(8.5, -1.0).validate().unwrap_err().to_string(),
            "invalid parameter `page.height`: must be greater than zero"
        );
        assert!(PageSpec::new(8.5, 11.0).validate().is_ok());
    }
}
