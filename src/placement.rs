//! Assigning images to pages and cells.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;
use core::iter::FusedIterator;

use crate::layout::{LayoutError, LayoutPlan};
#[cfg(feature = "alloc")]
use crate::layout::{Mode, Overflow, compute_layout};
#[cfg(feature = "alloc")]
use crate::page::PageSpec;

/// Axis-aligned rectangle in page units, origin at the top-left.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    /// Create a new frame.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Same rectangle in another unit.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

/// Where one image lands: which page, which cell, which rectangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Placement {
    /// Position in the caller's image list.
    pub image_index: usize,
    pub page_index: usize,
    pub column: u32,
    pub row: u32,
    /// Cell rectangle on its page, page units.
    pub frame: Frame,
}

impl Placement {
    /// Slot within the page, row-major.
    pub fn slot(&self, plan: &LayoutPlan) -> usize {
        self.image_index % plan.capacity_per_page() as usize
    }

    /// Same placement with its frame in another unit.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            frame: self.frame.scaled(factor),
            ..*self
        }
    }
}

impl LayoutPlan {
    /// The placement of image `image_index`, or `None` for zero-capacity plans.
    ///
    /// Images fill a row left to right, rows top to bottom, then move to the
    /// next page. Nothing is reordered or rebalanced.
    pub fn placement(&self, image_index: usize) -> Option<Placement> {
        let capacity = self.capacity_per_page() as usize;
        let columns = self.columns() as usize;
        if capacity == 0 || columns == 0 {
            return None;
        }
        let slot = image_index % capacity;
        let column = (slot % columns) as u32;
        let row = (slot / columns) as u32;
        let (x, y) = self.cell_origin(column, row);
        Some(Placement {
            image_index,
            page_index: image_index / capacity,
            column,
            row,
            frame: Frame::new(x, y, self.cell_width(), self.cell_height()),
        })
    }

    /// Placements for images `0..image_count`, in order, without allocating.
    ///
    /// Fails when the plan has no capacity but images were supplied. Zero
    /// images always succeeds with an empty iterator.
    pub fn placements(&self, image_count: usize) -> Result<Placements, LayoutError> {
        if image_count > 0 && self.capacity_per_page() == 0 {
            return Err(LayoutError::InvalidParameter {
                field: "image_count",
                reason: "no cell fits on the page",
            });
        }
        Ok(Placements {
            plan: *self,
            next: 0,
            end: image_count,
        })
    }

    /// Rectangle of the cell at `slot` (row-major), if the page has that slot.
    pub fn cell_frame(&self, slot: usize) -> Option<Frame> {
        if slot >= self.capacity_per_page() as usize {
            return None;
        }
        self.placement(slot).map(|p| p.frame)
    }

    /// Outline of the whole grid, from the first cell's top-left corner to
    /// the last cell's bottom-right. `None` when no cell fits.
    pub fn grid_bounds(&self) -> Option<Frame> {
        if self.columns() == 0 || self.rows() == 0 {
            return None;
        }
        let (left, top) = self.cell_origin(0, 0);
        let (x, y) = self.cell_origin(self.columns() - 1, self.rows() - 1);
        Some(Frame::new(
            left,
            top,
            x + self.cell_width() - left,
            y + self.cell_height() - top,
        ))
    }
}

/// Iterator returned by [`LayoutPlan::placements`].
#[derive(Clone, Debug)]
pub struct Placements {
    plan: LayoutPlan,
    next: usize,
    end: usize,
}

impl Iterator for Placements {
    type Item = Placement;

    fn next(&mut self) -> Option<Placement> {
        if self.next >= self.end {
            return None;
        }
        let placement = self.plan.placement(self.next)?;
        self.next += 1;
        Some(placement)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Placements {}

impl FusedIterator for Placements {}

/// All placements for `image_count` images under `plan`.
///
/// Same contract as [`LayoutPlan::placements`].
#[cfg(feature = "alloc")]
pub fn plan_placements(plan: &LayoutPlan, image_count: usize) -> Result<Vec<Placement>, LayoutError> {
    Ok(plan.placements(image_count)?.collect())
}

/// A plan together with the placements of every image.
///
/// This is what renderers consume. Unlike [`plan_placements`], an
/// overflowing plan is not an error here: it yields no placements and
/// [`overflow`](Self::overflow) tells the caller nothing fits.
///
/// ```
/// use snapsheet::{Mode, PageSpec, SheetLayout};
///
/// let sheet = SheetLayout::compute(&PageSpec::new(8.0, 8.0), &Mode::grid(2, 2, 0.1), 5).unwrap();
/// assert_eq!(sheet.page_count(), 2);
/// assert_eq!(sheet.page(1).len(), 1);
/// ```
#[cfg(feature = "alloc")]
#[derive(Clone, Debug, PartialEq)]
pub struct SheetLayout {
    plan: LayoutPlan,
    image_count: usize,
    placements: Vec<Placement>,
}

#[cfg(feature = "alloc")]
impl SheetLayout {
    /// Compute the plan and place `image_count` images.
    pub fn compute(page: &PageSpec, mode: &Mode, image_count: usize) -> Result<Self, LayoutError> {
        let plan = compute_layout(page, mode)?;
        Self::from_plan(plan, image_count)
    }

    /// Place `image_count` images under an existing plan.
    pub fn from_plan(plan: LayoutPlan, image_count: usize) -> Result<Self, LayoutError> {
        let placements = if plan.overflow().is_some() {
            tracing::debug!(image_count, "layout overflows the page, nothing placed");
            Vec::new()
        } else {
            plan_placements(&plan, image_count)?
        };
        Ok(Self {
            plan,
            image_count,
            placements,
        })
    }

    pub fn plan(&self) -> &LayoutPlan {
        &self.plan
    }

    /// Images the caller supplied, placed or not.
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    /// Every placement, ordered by image index.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn overflow(&self) -> Option<Overflow> {
        self.plan.overflow()
    }

    /// `ceil(image_count / capacity)`; zero when nothing fits or no images.
    pub fn page_count(&self) -> usize {
        self.plan.page_count(self.image_count)
    }

    /// Placements on one page, in image order. Empty past the last page.
    pub fn page(&self, page_index: usize) -> &[Placement] {
        let capacity = self.plan.capacity_per_page() as usize;
        let start = page_index.saturating_mul(capacity).min(self.placements.len());
        let end = start.saturating_add(capacity).min(self.placements.len());
        &self.placements[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Orientation, PaperSize};

    fn a4() -> PageSpec {
        PageSpec::paper(PaperSize::A4, Orientation::Portrait)
    }

    #[test]
    fn fills_rows_then_pages() {
        let plan = compute_layout(&a4(), &Mode::grid(2, 3, 0.1)).unwrap();
        let placed = plan_placements(&plan, 8).unwrap();
        let cells: Vec<_> = placed
            .iter()
            .map(|p| (p.page_index, p.column, p.row))
            .collect();
        assert_eq!(
            cells,
            [
                (0, 0, 0),
                (0, 1, 0),
                (0, 2, 0),
                (0, 0, 1),
                (0, 1, 1),
                (0, 2, 1),
                (1, 0, 0),
                (1, 1, 0),
            ]
        );
        // Second page reuses the first page's geometry
        assert_eq!(placed[6].frame, placed[0].frame);
        assert_eq!(placed[7].slot(&plan), 1);
    }

    #[test]
    fn frames_follow_cell_origin() {
        let plan = compute_layout(&PageSpec::new(7.0, 7.0), &Mode::manual(2.0, 2.0)).unwrap();
        let p = plan.placement(4).unwrap();
        assert_eq!((p.column, p.row), (1, 1));
        assert_eq!(p.frame, Frame::new(2.5, 2.5, 2.0, 2.0));
        assert_eq!(p.frame.right(), 4.5);
        assert_eq!(p.frame.bottom(), 4.5);
    }

    #[test]
    fn auto_capacity_leaves_trailing_cells_empty() {
        let plan = compute_layout(&a4(), &Mode::auto(8)).unwrap();
        let placed = plan_placements(&plan, 9).unwrap();
        // Ninth image starts page 1 even though the 3×3 grid has a ninth cell
        assert_eq!(placed[7].page_index, 0);
        assert_eq!((placed[7].column, placed[7].row), (1, 2));
        assert_eq!(placed[8].page_index, 1);
        assert_eq!((placed[8].column, placed[8].row), (0, 0));
        assert!(plan.cell_frame(8).is_none());
        assert!(plan.cell_frame(7).is_some());
    }

    #[test]
    fn grid_bounds_spans_every_cell() {
        let plan = compute_layout(&PageSpec::new(7.0, 7.0), &Mode::manual(2.0, 2.0)).unwrap();
        assert_eq!(plan.grid_bounds(), Some(Frame::new(0.25, 0.25, 6.5, 6.5)));
        let empty = compute_layout(&PageSpec::new(7.0, 7.0), &Mode::manual(8.0, 2.0)).unwrap();
        assert_eq!(empty.grid_bounds(), None);
    }

    #[test]
    fn scaled_placement_keeps_indices() {
        let plan = compute_layout(&PageSpec::new(7.0, 7.0), &Mode::manual(2.0, 2.0)).unwrap();
        let p = plan.placement(4).unwrap().scaled(96.0);
        assert_eq!((p.image_index, p.page_index, p.column, p.row), (4, 0, 1, 1));
        assert_eq!(p.frame, Frame::new(240.0, 240.0, 192.0, 192.0));
    }

    #[test]
    fn iterator_is_exact_size() {
        let plan = compute_layout(&a4(), &Mode::manual(2.0, 2.0)).unwrap();
        let mut it = plan.placements(3).unwrap();
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
        assert_eq!(it.by_ref().count(), 2);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn zero_images_is_empty_even_when_nothing_fits() {
        let plan = compute_layout(&a4(), &Mode::manual(20.0, 20.0)).unwrap();
        assert!(plan_placements(&plan, 0).unwrap().is_empty());
        assert_eq!(
            plan_placements(&plan, 1),
            Err(LayoutError::InvalidParameter {
                field: "image_count",
                reason: "no cell fits on the page",
            })
        );
        assert!(plan.placement(0).is_none());
    }

    #[test]
    fn sheet_overflow_is_not_fatal() {
        let sheet = SheetLayout::compute(&a4(), &Mode::manual(9.0, 12.0), 4).unwrap();
        assert!(sheet.placements().is_empty());
        assert_eq!(sheet.page_count(), 0);
        assert_eq!(sheet.image_count(), 4);
        let overflow = sheet.overflow().unwrap();
        assert!(overflow.horizontal && overflow.vertical);
    }

    #[test]
    fn sheet_pages_slice_placements() {
        let sheet = SheetLayout::compute(&a4(), &Mode::grid(2, 2, 0.1), 5).unwrap();
        assert_eq!(sheet.page_count(), 2);
        let first: Vec<_> = sheet.page(0).iter().map(|p| p.image_index).collect();
        assert_eq!(first, [0, 1, 2, 3]);
        let second = sheet.page(1);
        assert_eq!(second.len(), 1);
        assert_eq!((second[0].image_index, second[0].column, second[0].row), (4, 0, 0));
        assert!(sheet.page(2).is_empty());
        assert!(sheet.page(usize::MAX).is_empty());
    }

    #[test]
    fn sheet_rejects_invalid_mode() {
        assert!(SheetLayout::compute(&a4(), &Mode::auto(0), 3).is_err());
    }
}
