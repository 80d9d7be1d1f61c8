//! Grid geometry for laying images out on a page.
//!
//! One entry point, [`compute_layout`], turns a [`PageSpec`] and a [`Mode`]
//! into a [`LayoutPlan`]: cell size, grid shape, spacing, and how many images
//! fit on one page. Pure geometry: no image data, no allocations, no state
//! between calls.
//!
//! # Example
//!
//! ```
//! use snapsheet::{Mode, Orientation, PageSpec, PaperSize, compute_layout};
//!
//! let page = PageSpec::paper(PaperSize::A4, Orientation::Portrait);
//! let plan = compute_layout(&page, &Mode::manual(2.0, 2.0)).unwrap();
//!
//! // 2"×2" photos: 4 across, 5 down on A4 portrait
//! assert_eq!((plan.columns(), plan.rows()), (4, 5));
//! assert_eq!(plan.capacity_per_page(), 20);
//! ```

use num_traits::Float;

use crate::page::{PageSpec, positive};

/// Fraction of each axis given to cells in [`Mode::Auto`]; the rest is spacing.
const AUTO_CELL_FRACTION: f64 = 0.9;

/// Spacing within this fraction of the page dimension is rounding noise.
const SPACING_SNAP: f64 = 1e-9;

/// How image cells are sized and arranged on the page.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "lowercase"))]
pub enum Mode {
    /// Fixed cell size. As many columns and rows as fit; extra images paginate.
    Manual {
        /// Cell width, page units.
        image_width: f64,
        /// Cell height, page units.
        image_height: f64,
    },
    /// Fixed image count per page on the smallest near-square grid that
    /// holds it. Cells are square.
    Auto {
        /// Images per page, at least 1.
        images_per_page: u32,
    },
    /// Fixed rows × columns. Cells are square and fill the page minus the
    /// margin.
    Grid {
        rows: u32,
        columns: u32,
        /// Fraction of the page in `0.0..1.0`; half of it is given up per axis.
        margin: f64,
    },
}

impl Mode {
    /// Form default for [`Mode::Auto`]. The engine never applies it.
    pub const DEFAULT_IMAGES_PER_PAGE: u32 = 8;
    /// Form default for the [`Mode::Grid`] margin. The engine never applies it.
    pub const DEFAULT_GRID_MARGIN: f64 = 0.15;
    /// Form default cell side for [`Mode::Manual`], in inches.
    pub const DEFAULT_IMAGE_SIZE: f64 = 2.0;

    /// Fixed cell size.
    pub const fn manual(image_width: f64, image_height: f64) -> Self {
        Self::Manual {
            image_width,
            image_height,
        }
    }

    /// Fixed count per page.
    pub const fn auto(images_per_page: u32) -> Self {
        Self::Auto { images_per_page }
    }

    /// Fixed grid shape.
    pub const fn grid(rows: u32, columns: u32, margin: f64) -> Self {
        Self::Grid {
            rows,
            columns,
            margin,
        }
    }

    /// Check caller-supplied parameters. Nothing is defaulted or clamped.
    pub fn validate(&self) -> Result<(), LayoutError> {
        match *self {
            Self::Manual {
                image_width,
                image_height,
            } => {
                positive("image_width", image_width)?;
                positive("image_height", image_height)
            }
            Self::Auto { images_per_page } => {
                at_least_one("images_per_page", images_per_page)
            }
            Self::Grid {
                rows,
                columns,
                margin,
            } => {
                at_least_one("rows", rows)?;
                at_least_one("columns", columns)?;
                if !(0.0..1.0).contains(&margin) {
                    return Err(LayoutError::InvalidParameter {
                        field: "margin",
                        reason: "must be in 0.0..1.0",
                    });
                }
                Ok(())
            }
        }
    }
}

/// Layout computation error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LayoutError {
    /// A caller-supplied value is out of range.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        /// Name of the offending input.
        field: &'static str,
        /// What the value violates.
        reason: &'static str,
    },
}

/// Which axes of a plan fail to fit on the page.
///
/// A plan overflows when the configured cell is larger than the page
/// (zero columns or rows) or the spacing came out negative. Such plans
/// place nothing; see [`SheetLayout`](crate::SheetLayout).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Overflow {
    pub horizontal: bool,
    pub vertical: bool,
}

/// Derived page geometry for one [`PageSpec`] + [`Mode`].
///
/// All lengths are in the page's unit. Cell `(column, row)` sits at
/// `x = h_spacing + column * (cell_width + h_spacing)` and likewise for `y`,
/// so every gap, including both outer ones, is the same size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutPlan {
    page_width: f64,
    page_height: f64,
    cell_width: f64,
    cell_height: f64,
    columns: u32,
    rows: u32,
    horizontal_spacing: f64,
    vertical_spacing: f64,
    capacity_per_page: u32,
}

impl LayoutPlan {
    /// Oriented page width.
    pub const fn page_width(&self) -> f64 {
        self.page_width
    }

    /// Oriented page height.
    pub const fn page_height(&self) -> f64 {
        self.page_height
    }

    /// Width of one cell.
    pub const fn cell_width(&self) -> f64 {
        self.cell_width
    }

    /// Height of one cell.
    pub const fn cell_height(&self) -> f64 {
        self.cell_height
    }

    /// Cells across the page. Zero when one cell is wider than the page.
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Cells down the page. Zero when one cell is taller than the page.
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Gap before the first column and after every column.
    pub const fn horizontal_spacing(&self) -> f64 {
        self.horizontal_spacing
    }

    /// Gap before the first row and after every row.
    pub const fn vertical_spacing(&self) -> f64 {
        self.vertical_spacing
    }

    /// Images placed on one page before the next page starts.
    ///
    /// `columns × rows` for manual and grid modes; the requested count for
    /// auto mode, which may leave trailing cells of the grid empty.
    pub const fn capacity_per_page(&self) -> u32 {
        self.capacity_per_page
    }

    /// `None` when every cell fits on the page.
    pub fn overflow(&self) -> Option<Overflow> {
        let horizontal = self.columns == 0 || self.horizontal_spacing < 0.0;
        let vertical = self.rows == 0 || self.vertical_spacing < 0.0;
        (horizontal || vertical).then_some(Overflow {
            horizontal,
            vertical,
        })
    }

    /// Pages needed for `image_count` images. Zero for overflowing plans.
    pub fn page_count(&self, image_count: usize) -> usize {
        if self.overflow().is_some() {
            return 0;
        }
        image_count.div_ceil(self.capacity_per_page as usize)
    }

    /// Top-left corner of cell `(column, row)`.
    pub fn cell_origin(&self, column: u32, row: u32) -> (f64, f64) {
        let x = self.horizontal_spacing
            + f64::from(column) * (self.cell_width + self.horizontal_spacing);
        let y = self.vertical_spacing
            + f64::from(row) * (self.cell_height + self.vertical_spacing);
        (x, y)
    }

    /// Same geometry in another unit, e.g. `plan.scaled(PX_PER_INCH)`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            page_width: self.page_width * factor,
            page_height: self.page_height * factor,
            cell_width: self.cell_width * factor,
            cell_height: self.cell_height * factor,
            horizontal_spacing: self.horizontal_spacing * factor,
            vertical_spacing: self.vertical_spacing * factor,
            ..*self
        }
    }

    fn centered(
        (page_width, page_height): (f64, f64),
        (cell_width, cell_height): (f64, f64),
        (columns, rows): (u32, u32),
        capacity_per_page: u32,
    ) -> Self {
        Self {
            page_width,
            page_height,
            cell_width,
            cell_height,
            columns,
            rows,
            horizontal_spacing: even_gap(page_width, cell_width, columns),
            vertical_spacing: even_gap(page_height, cell_height, rows),
            capacity_per_page,
        }
    }
}

/// Compute the page geometry for a mode.
///
/// Fails with [`LayoutError::InvalidParameter`] for non-positive or
/// non-finite page dimensions and mode parameters out of range. A cell
/// larger than the page is not an error: the plan comes back with zero
/// capacity and [`LayoutPlan::overflow`] set.
///
/// The number of images never influences the plan; pagination is the job
/// of [`LayoutPlan::placements`].
pub fn compute_layout(page: &PageSpec, mode: &Mode) -> Result<LayoutPlan, LayoutError> {
    page.validate()?;
    mode.validate()?;
    let dims = page.dimensions();
    let (page_w, page_h) = dims;

    let plan = match *mode {
        Mode::Manual {
            image_width,
            image_height,
        } => {
            let columns = fit_count("image_width", page_w, image_width)?;
            let rows = fit_count("image_height", page_h, image_height)?;
            LayoutPlan::centered(
                dims,
                (image_width, image_height),
                (columns, rows),
                cell_count("image_width", columns, rows)?,
            )
        }
        Mode::Auto { images_per_page } => {
            let columns = ceil_sqrt(images_per_page);
            let rows = images_per_page.div_ceil(columns);
            let side = square_cell(dims, (columns, rows), AUTO_CELL_FRACTION);
            LayoutPlan::centered(dims, (side, side), (columns, rows), images_per_page)
        }
        Mode::Grid {
            rows,
            columns,
            margin,
        } => {
            let side = square_cell(dims, (columns, rows), 1.0 - margin / 2.0);
            LayoutPlan::centered(
                dims,
                (side, side),
                (columns, rows),
                cell_count("columns", columns, rows)?,
            )
        }
    };

    tracing::debug!(
        ?mode,
        columns = plan.columns,
        rows = plan.rows,
        cell_width = plan.cell_width,
        cell_height = plan.cell_height,
        capacity = plan.capacity_per_page,
        overflow = plan.overflow().is_some(),
        "computed layout plan"
    );
    Ok(plan)
}

fn at_least_one(field: &'static str, value: u32) -> Result<(), LayoutError> {
    if value == 0 {
        return Err(LayoutError::InvalidParameter {
            field,
            reason: "must be at least 1",
        });
    }
    Ok(())
}

/// Whole cells of size `cell` that fit in `span`.
fn fit_count(field: &'static str, span: f64, cell: f64) -> Result<u32, LayoutError> {
    let count = Float::floor(span / cell);
    if count > f64::from(u32::MAX) {
        return Err(LayoutError::InvalidParameter {
            field,
            reason: "too small for the page",
        });
    }
    Ok(count as u32)
}

/// `columns × rows`, which must fit a `u32` capacity.
fn cell_count(field: &'static str, columns: u32, rows: u32) -> Result<u32, LayoutError> {
    columns
        .checked_mul(rows)
        .ok_or(LayoutError::InvalidParameter {
            field,
            reason: "too many cells per page",
        })
}

/// Smallest `c` with `c * c >= n`.
fn ceil_sqrt(n: u32) -> u32 {
    let n = u64::from(n);
    let mut c = Float::sqrt(n as f64) as u64;
    while c * c < n {
        c += 1;
    }
    while c > 1 && (c - 1) * (c - 1) >= n {
        c -= 1;
    }
    c as u32
}

/// Side of a square cell: each axis scaled by `fraction`, smaller axis wins
/// so the square never overflows either direction.
fn square_cell((page_w, page_h): (f64, f64), (columns, rows): (u32, u32), fraction: f64) -> f64 {
    let w = page_w / f64::from(columns) * fraction;
    let h = page_h / f64::from(rows) * fraction;
    w.min(h)
}

/// Leftover space split into `count + 1` equal gaps.
fn even_gap(span: f64, cell: f64, count: u32) -> f64 {
    let gap = (span - f64::from(count) * cell) / (f64::from(count) + 1.0);
    if Float::abs(gap) < span * SPACING_SNAP {
        0.0
    } else {
        gap
    }
}
