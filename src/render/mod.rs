//! Painting a [`SheetLayout`] onto a surface.
//!
//! The [`Renderer`] walks the placements of a sheet, resolves each image
//! through an [`ImageResolver`], and issues draw commands to a [`Surface`].
//! A raster preview ([`RasterSurface`]) and a PDF export
//! ([`PdfSurface`], feature `pdf`) consume the same command stream, so what
//! the preview shows is what the export contains.
//!
//! Decoding is the only suspension point. Every render holds a [`Ticket`]
//! for the generation of its inputs. Rendering the same page, plan and image
//! count again shares that generation, so a preview and an export of one
//! sheet can run side by side. New inputs, or [`Renderer::invalidate`], move
//! the generation on: older renders stop at once, drop their in-flight
//! decodes, and never paint at stale coordinates.
//!
//! # Example
//!
//! ```no_run
//! use snapsheet::render::{EncodedImages, RasterSurface, Renderer};
//! use snapsheet::{Mode, Orientation, PageSpec, PaperSize, SheetLayout};
//!
//! # async fn preview(photos: Vec<Vec<u8>>) -> Result<(), Box<dyn std::error::Error>> {
//! let page = PageSpec::paper(PaperSize::A4, Orientation::Portrait);
//! let sheet = SheetLayout::compute(&page, &Mode::auto(8), photos.len())?;
//!
//! let renderer = Renderer::new(EncodedImages::new(photos));
//! let mut surface = RasterSurface::new(&page);
//! let report = renderer.render(&page, &sheet, &mut surface).await?;
//! assert!(report.warnings.is_empty());
//! surface.into_image().save("preview.png")?;
//! # Ok(())
//! # }
//! ```

mod generation;
#[cfg(feature = "pdf")]
mod pdf;
mod raster;
mod resolve;

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::{self, Either};
use futures::stream::{self, StreamExt};
use image::DynamicImage;

pub use generation::{Generation, Ticket};
#[cfg(feature = "pdf")]
pub use pdf::PdfSurface;
pub use raster::RasterSurface;
pub use resolve::{DecodeError, EncodedImages, ImageResolver};

use crate::color::Color;
use crate::layout::{LayoutPlan, Overflow};
use crate::page::PageSpec;
use crate::placement::{Frame, Placement, SheetLayout};

/// Which pages a surface shows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceTarget {
    /// One page only; placements on other pages are skipped.
    SinglePage(usize),
    /// Every page. All pages are begun and decorated before any image is
    /// drawn, and images then address their page by index.
    Paginated,
}

/// Something draw commands can be issued against.
///
/// All coordinates are in page units with the origin at the page's top-left;
/// each surface converts to its own device space. Fills and lines apply to
/// the page most recently begun; images go to `placement.page_index`, which
/// has always been begun already.
pub trait Surface {
    fn target(&self) -> SurfaceTarget;

    /// Start (or clear) page `page_index`.
    fn begin_page(&mut self, page_index: usize, page: &PageSpec) -> Result<(), SurfaceError>;

    fn fill_rect(&mut self, frame: Frame, color: Color) -> Result<(), SurfaceError>;

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) -> Result<(), SurfaceError>;

    /// Draw `image` stretched to `placement.frame`.
    fn draw_image(&mut self, placement: &Placement, image: &DynamicImage) -> Result<(), SurfaceError>;
}

/// A surface failed to accept a command.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SurfaceError {
    /// Re-encoding an image for the output format failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    /// An image targeted a page that was never begun.
    #[error("page {0} was not begun before drawing")]
    PageNotBegun(usize),
}

/// Fatal render failure. Per-image problems are [`RenderWarning`]s instead.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Non-fatal problem with one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderWarning {
    /// The image could not be resolved; its cell was left blank.
    DecodeFailed { image_index: usize, message: String },
}

/// What a render did.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    /// Generation the render ran under.
    pub generation: u64,
    /// Pages begun on the surface.
    pub pages: usize,
    /// Images painted.
    pub drawn: usize,
    pub warnings: Vec<RenderWarning>,
    /// Set when the plan places nothing because cells exceed the page.
    pub overflow: Option<Overflow>,
    /// Inputs changed mid-render; remaining results were discarded.
    pub superseded: bool,
}

/// Renderer knobs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Image decodes allowed in flight at once.
    pub concurrency: usize,
    /// Give up on a decode after this long and leave its cell blank.
    ///
    /// `None` waits indefinitely. A timeout needs a tokio runtime with the
    /// time driver enabled.
    pub decode_timeout: Option<Duration>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            decode_timeout: None,
        }
    }
}

impl RenderOptions {
    /// Set decode concurrency, at least 1.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-image decode timeout.
    pub fn decode_timeout(mut self, timeout: Duration) -> Self {
        self.decode_timeout = Some(timeout);
        self
    }
}

/// What a render was asked to paint. Equal inputs share a generation.
#[derive(Copy, Clone, Debug, PartialEq)]
struct RenderInputs {
    page: PageSpec,
    plan: LayoutPlan,
    image_count: usize,
}

/// Resolves images and paints sheets onto surfaces.
#[derive(Debug)]
pub struct Renderer<R> {
    resolver: R,
    generation: Generation,
    options: RenderOptions,
    last_inputs: Mutex<Option<RenderInputs>>,
}

impl<R: ImageResolver> Renderer<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            generation: Generation::new(),
            options: RenderOptions::default(),
            last_inputs: Mutex::new(None),
        }
    }

    /// Replace the render options.
    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Handle to the generation counter, for invalidating from elsewhere.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Mark every in-flight render as superseded.
    pub fn invalidate(&self) -> u64 {
        self.generation.invalidate()
    }

    /// Paint `sheet` onto `surface`.
    ///
    /// Every page the surface shows is begun, filled with the background,
    /// and outlined (when grid lines are on) before any image is drawn.
    /// Images are painted as their decodes finish, each at its planned
    /// frame, so one slow or hung decode never holds back the others. An
    /// image that fails to resolve leaves its cell blank and is reported in
    /// [`RenderReport::warnings`].
    ///
    /// Rendering different inputs than the previous call supersedes every
    /// earlier render on this renderer; the same inputs join the current
    /// generation.
    pub async fn render<S: Surface + ?Sized>(
        &self,
        page: &PageSpec,
        sheet: &SheetLayout,
        surface: &mut S,
    ) -> Result<RenderReport, RenderError> {
        let plan = sheet.plan();
        let ticket = self.ticket_for(RenderInputs {
            page: *page,
            plan: *plan,
            image_count: sheet.image_count(),
        });
        let mut report = RenderReport {
            generation: ticket.generation(),
            pages: 0,
            drawn: 0,
            warnings: Vec::new(),
            overflow: sheet.overflow(),
            superseded: false,
        };
        if let Some(overflow) = report.overflow {
            tracing::warn!(?overflow, images = sheet.image_count(), "no image cell fits on the page");
        }

        let shown = match surface.target() {
            SurfaceTarget::SinglePage(index) => {
                begin_decorated_page(surface, index, page, plan)?;
                report.pages = 1;
                sheet.page(index)
            }
            SurfaceTarget::Paginated => {
                report.pages = sheet.page_count().max(1);
                for index in 0..report.pages {
                    begin_decorated_page(surface, index, page, plan)?;
                }
                sheet.placements()
            }
        };

        let results = stream::iter(shown.iter().copied())
            .map(|placement| async move { (placement, self.resolve(placement.image_index).await) })
            .buffer_unordered(self.options.concurrency.max(1));
        let stale = ticket.superseded();
        futures::pin_mut!(results, stale);

        loop {
            let (placement, result) = match future::select(stale.as_mut(), results.next()).await {
                Either::Left(_) => {
                    report.superseded = true;
                    break;
                }
                Either::Right((None, _)) => break,
                Either::Right((Some(item), _)) => item,
            };
            if !ticket.is_current() {
                report.superseded = true;
                break;
            }
            match result {
                Ok(image) => {
                    surface.draw_image(&placement, &image)?;
                    report.drawn += 1;
                    tracing::trace!(
                        image_index = placement.image_index,
                        page_index = placement.page_index,
                        "drew image"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        image_index = placement.image_index,
                        error = %err,
                        "image failed to resolve, leaving cell blank"
                    );
                    report.warnings.push(RenderWarning::DecodeFailed {
                        image_index: placement.image_index,
                        message: err.to_string(),
                    });
                }
            }
        }
        if report.superseded {
            tracing::debug!(
                generation = ticket.generation(),
                drawn = report.drawn,
                "inputs changed, dropped in-flight decodes"
            );
        }

        tracing::debug!(
            generation = report.generation,
            pages = report.pages,
            drawn = report.drawn,
            warnings = report.warnings.len(),
            superseded = report.superseded,
            "render finished"
        );
        Ok(report)
    }

    /// Join the current generation for unchanged inputs, else advance it.
    fn ticket_for(&self, inputs: RenderInputs) -> Ticket {
        let mut last = self.last_inputs.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(&inputs) {
            return self.generation.ticket();
        }
        *last = Some(inputs);
        self.generation.advance()
    }

    async fn resolve(&self, image_index: usize) -> Result<DynamicImage, DecodeError> {
        match self.options.decode_timeout {
            Some(limit) => tokio::time::timeout(limit, self.resolver.resolve(image_index))
                .await
                .unwrap_or(Err(DecodeError::TimedOut(limit))),
            None => self.resolver.resolve(image_index).await,
        }
    }
}

fn begin_decorated_page<S: Surface + ?Sized>(
    surface: &mut S,
    page_index: usize,
    page: &PageSpec,
    plan: &LayoutPlan,
) -> Result<(), SurfaceError> {
    surface.begin_page(page_index, page)?;
    let (width, height) = page.dimensions();
    if !page.background.is_transparent() {
        surface.fill_rect(Frame::new(0.0, 0.0, width, height), page.background)?;
    }
    if page.show_grid_lines && plan.overflow().is_none() {
        for (from, to) in grid_lines(plan) {
            surface.line(from, to, page.grid_line_color)?;
        }
    }
    Ok(())
}

type Segment = ((f64, f64), (f64, f64));

/// Segments outlining every cell: both edges of each column spanning the
/// grid's height, then both edges of each row spanning its width. Produced
/// lazily, since tiny cells can mean millions of lines.
fn grid_lines(plan: &LayoutPlan) -> impl Iterator<Item = Segment> + '_ {
    let bounds = plan.grid_bounds();
    let (columns, rows) = match bounds {
        Some(_) => (plan.columns(), plan.rows()),
        None => (0, 0),
    };
    let bounds = bounds.unwrap_or_default();
    let vertical = (0..columns)
        .flat_map(move |column| {
            let (x, _) = plan.cell_origin(column, 0);
            [x, x + plan.cell_width()]
        })
        .map(move |x| ((x, bounds.y), (x, bounds.bottom())));
    let horizontal = (0..rows)
        .flat_map(move |row| {
            let (_, y) = plan.cell_origin(0, row);
            [y, y + plan.cell_height()]
        })
        .map(move |y| ((bounds.x, y), (bounds.right(), y)));
    vertical.chain(horizontal)
}

/// One command as seen by a [`CommandLog`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    BeginPage {
        page_index: usize,
    },
    FillRect {
        frame: Frame,
        color: Color,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Color,
    },
    DrawImage {
        image_index: usize,
        page_index: usize,
        frame: Frame,
        /// Pixel size of the decoded image.
        size: (u32, u32),
    },
}

/// Surface that records commands instead of painting.
#[derive(Clone, Debug)]
pub struct CommandLog {
    target: SurfaceTarget,
    pub commands: Vec<DrawCommand>,
}

impl CommandLog {
    /// Record every page.
    pub fn paginated() -> Self {
        Self {
            target: SurfaceTarget::Paginated,
            commands: Vec::new(),
        }
    }

    /// Record one page, like a preview would.
    pub fn single_page(page_index: usize) -> Self {
        Self {
            target: SurfaceTarget::SinglePage(page_index),
            commands: Vec::new(),
        }
    }

    /// Image indices in the order they were drawn.
    pub fn drawn_images(&self) -> Vec<usize> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawImage { image_index, .. } => Some(*image_index),
                _ => None,
            })
            .collect()
    }
}

impl Surface for CommandLog {
    fn target(&self) -> SurfaceTarget {
        self.target
    }

    fn begin_page(&mut self, page_index: usize, _page: &PageSpec) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::BeginPage { page_index });
        Ok(())
    }

    fn fill_rect(&mut self, frame: Frame, color: Color) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::FillRect { frame, color });
        Ok(())
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::Line { from, to, color });
        Ok(())
    }

    fn draw_image(&mut self, placement: &Placement, image: &DynamicImage) -> Result<(), SurfaceError> {
        self.commands.push(DrawCommand::DrawImage {
            image_index: placement.image_index,
            page_index: placement.page_index,
            frame: placement.frame,
            size: (image.width(), image.height()),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Mode, compute_layout};

    #[test]
    fn grid_lines_outline_every_cell() {
        let plan = compute_layout(&PageSpec::new(7.0, 7.0), &Mode::manual(2.0, 2.0)).unwrap();
        let lines: Vec<_> = grid_lines(&plan).collect();
        // 3 columns + 3 rows, two edges each
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], ((0.25, 0.25), (0.25, 6.75)));
        assert_eq!(lines[1], ((2.25, 0.25), (2.25, 6.75)));
        assert_eq!(lines[6], ((0.25, 0.25), (6.75, 0.25)));
    }

    #[test]
    fn grid_lines_empty_for_overflow() {
        let plan = compute_layout(&PageSpec::new(7.0, 7.0), &Mode::manual(8.0, 2.0)).unwrap();
        assert_eq!(grid_lines(&plan).count(), 0);
    }

    #[test]
    fn grid_lines_are_lazy_for_tiny_cells() {
        let side = 1.0 / 1_048_576.0;
        let plan = compute_layout(&PageSpec::new(8.0, 8.0), &Mode::manual(side, 8.0)).unwrap();
        assert_eq!(plan.columns(), 8_388_608);
        let mut lines = grid_lines(&plan);
        assert_eq!(lines.next(), Some(((0.0, 0.0), (0.0, 8.0))));
        assert_eq!(lines.next(), Some(((side, 0.0), (side, 8.0))));
    }

    #[test]
    fn same_inputs_share_a_generation() {
        let renderer = Renderer::new(EncodedImages::default());
        let page = PageSpec::new(8.0, 8.0);
        let plan = compute_layout(&page, &Mode::manual(2.0, 2.0)).unwrap();
        let inputs = RenderInputs {
            page,
            plan,
            image_count: 3,
        };
        let first = renderer.ticket_for(inputs);
        let again = renderer.ticket_for(inputs);
        assert_eq!(first.generation(), again.generation());
        assert!(first.is_current());

        let changed = renderer.ticket_for(RenderInputs {
            image_count: 4,
            ..inputs
        });
        assert!(!first.is_current());
        assert_eq!(changed.generation(), first.generation() + 1);
    }

    #[test]
    fn concurrency_is_at_least_one() {
        assert_eq!(RenderOptions::default().concurrency(0).concurrency, 1);
        assert_eq!(RenderOptions::default().concurrency, 4);
        assert_eq!(RenderOptions::default().decode_timeout, None);
    }
}
