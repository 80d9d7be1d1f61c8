//! Paginated PDF export.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

use super::{Surface, SurfaceError, SurfaceTarget};
use crate::color::Color;
use crate::page::{PT_PER_INCH, PageSpec};
use crate::placement::{Frame, Placement};

/// Stroke width for grid lines, in points.
const GRID_LINE_WIDTH: f32 = 0.5;

struct PdfPage {
    id: Ref,
    content_id: Ref,
    content: Content,
    /// XObject resource name and reference for every image on the page.
    images: Vec<(String, Ref)>,
}

/// Multi-page PDF document, one PDF page per sheet page.
///
/// Page units are taken as inches. Images are embedded as baseline JPEG
/// and stretched to their cell. Call [`finish`](Self::finish) for the file
/// bytes; a document with nothing begun still gets one blank page.
pub struct PdfSurface {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    /// Oriented page size in points.
    size_pt: (f32, f32),
    pages: Vec<PdfPage>,
    jpeg_quality: u8,
    image_count: usize,
}

impl PdfSurface {
    pub fn new(page: &PageSpec) -> Self {
        let (w, h) = page.scaled_dimensions(PT_PER_INCH);
        Self {
            pdf: Pdf::new(),
            next_id: 3,
            catalog_id: Ref::new(1),
            pages_id: Ref::new(2),
            size_pt: (w as f32, h as f32),
            pages: Vec::new(),
            jpeg_quality: 90,
            image_count: 0,
        }
    }

    /// JPEG quality for embedded images, 1..=100.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Pages begun so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize the document.
    pub fn finish(mut self) -> Vec<u8> {
        if self.pages.is_empty() {
            self.push_page();
        }
        let Self {
            mut pdf,
            catalog_id,
            pages_id,
            size_pt: (width, height),
            pages,
            ..
        } = self;

        let page_ids: Vec<Ref> = pages.iter().map(|p| p.id).collect();
        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);

        for page in pages {
            pdf.stream(page.content_id, &page.content.finish());
            let mut writer = pdf.page(page.id);
            writer
                .media_box(Rect::new(0.0, 0.0, width, height))
                .parent(pages_id)
                .contents(page.content_id);
            let mut resources = writer.resources();
            let mut xobjects = resources.x_objects();
            for (name, id) in &page.images {
                xobjects.pair(Name(name.as_bytes()), *id);
            }
        }
        tracing::debug!(pages = page_ids.len(), "pdf document finished");
        pdf.finish()
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn push_page(&mut self) {
        let id = self.alloc();
        let content_id = self.alloc();
        self.pages.push(PdfPage {
            id,
            content_id,
            content: Content::new(),
            images: Vec::new(),
        });
    }

    fn current(&mut self) -> Result<&mut PdfPage, SurfaceError> {
        let index = self.pages.len().saturating_sub(1);
        self.pages
            .last_mut()
            .ok_or(SurfaceError::PageNotBegun(index))
    }

    /// Top-left page-unit frame to a bottom-left PDF rect `(x, y, w, h)`.
    fn to_pdf(&self, frame: Frame) -> (f32, f32, f32, f32) {
        let f = frame.scaled(PT_PER_INCH);
        (
            f.x as f32,
            self.size_pt.1 - f.bottom() as f32,
            f.width as f32,
            f.height as f32,
        )
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>, SurfaceError> {
        let rgb = image.to_rgb8();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality).encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(jpeg)
    }
}

impl Surface for PdfSurface {
    fn target(&self) -> SurfaceTarget {
        SurfaceTarget::Paginated
    }

    fn begin_page(&mut self, page_index: usize, _page: &PageSpec) -> Result<(), SurfaceError> {
        while self.pages.len() <= page_index {
            self.push_page();
        }
        Ok(())
    }

    fn fill_rect(&mut self, frame: Frame, color: Color) -> Result<(), SurfaceError> {
        if color.is_transparent() {
            return Ok(());
        }
        let (x, y, w, h) = self.to_pdf(frame);
        let [r, g, b] = color.unit_rgb();
        let content = &mut self.current()?.content;
        content.save_state();
        content.set_fill_rgb(r, g, b);
        content.rect(x, y, w, h);
        content.fill_nonzero();
        content.restore_state();
        Ok(())
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Color) -> Result<(), SurfaceError> {
        let height = self.size_pt.1;
        let point = |(x, y): (f64, f64)| ((x * PT_PER_INCH) as f32, height - (y * PT_PER_INCH) as f32);
        let (x0, y0) = point(from);
        let (x1, y1) = point(to);
        let [r, g, b] = color.unit_rgb();
        let content = &mut self.current()?.content;
        content.save_state();
        content.set_line_width(GRID_LINE_WIDTH);
        content.set_stroke_rgb(r, g, b);
        content.move_to(x0, y0);
        content.line_to(x1, y1);
        content.stroke();
        content.restore_state();
        Ok(())
    }

    fn draw_image(&mut self, placement: &Placement, image: &DynamicImage) -> Result<(), SurfaceError> {
        if self.pages.len() <= placement.page_index {
            return Err(SurfaceError::PageNotBegun(placement.page_index));
        }
        let jpeg = self.encode_jpeg(image)?;
        let id = self.alloc();
        {
            let mut xobj = self.pdf.image_xobject(id, &jpeg);
            xobj.filter(Filter::DctDecode);
            xobj.width(image.width() as i32);
            xobj.height(image.height() as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        self.image_count += 1;
        let name = format!("Im{}", self.image_count);

        let (x, y, w, h) = self.to_pdf(placement.frame);
        let page = &mut self.pages[placement.page_index];
        page.content.save_state();
        page.content.transform([w, 0.0, 0.0, h, x, y]);
        page.content.x_object(Name(name.as_bytes()));
        page.content.restore_state();
        page.images.push((name, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Mode, compute_layout};
    use image::{Rgb, RgbImage};

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn empty_document_has_one_page() {
        let bytes = PdfSurface::new(&PageSpec::new(8.5, 11.0)).finish();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(count(&bytes, b"/MediaBox"), 1);
    }

    #[test]
    fn image_requires_begun_page() {
        let page = PageSpec::new(8.5, 11.0);
        let plan = compute_layout(&page, &Mode::manual(2.0, 2.0)).unwrap();
        let mut surface = PdfSurface::new(&page);
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 128, 255])));
        let err = surface.draw_image(&plan.placement(0).unwrap(), &img);
        assert!(matches!(err, Err(SurfaceError::PageNotBegun(0))));

        surface.begin_page(0, &page).unwrap();
        surface.draw_image(&plan.placement(0).unwrap(), &img).unwrap();
        let bytes = surface.finish();
        assert_eq!(count(&bytes, b"/DCTDecode"), 1);
    }

    #[test]
    fn frames_flip_to_bottom_left_origin() {
        let surface = PdfSurface::new(&PageSpec::new(8.5, 11.0));
        let (x, y, w, h) = surface.to_pdf(Frame::new(1.0, 1.0, 2.0, 3.0));
        assert_eq!((x, w, h), (72.0, 144.0, 216.0));
        // 11in page: bottom edge of the frame is 4in from the top
        assert_eq!(y, 792.0 - 288.0);
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        let page = PageSpec::new(8.5, 11.0);
        assert_eq!(PdfSurface::new(&page).jpeg_quality(0).jpeg_quality, 1);
        assert_eq!(PdfSurface::new(&page).jpeg_quality(250).jpeg_quality, 100);
    }
}
