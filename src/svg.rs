//! SVG wireframe of one planned page.
//!
//! Draws the page, every cell slot of the grid (dashed when no image lands
//! in it), each placed image numbered by its index, and a caption with the
//! plan's numbers. Handy for eyeballing a layout without decoding anything.
//!
//! # Example
//!
//! ```
//! use snapsheet::{Mode, PageSpec, SheetLayout, svg::render_page_svg};
//!
//! let page = PageSpec::new(8.27, 11.69);
//! let sheet = SheetLayout::compute(&page, &Mode::grid(2, 2, 0.1), 5).unwrap();
//!
//! let svg = render_page_svg(&page, &sheet, 1);
//! assert!(svg.contains("page 2 of 2"));
//! ```

#[cfg(not(feature = "std"))]
use alloc::format;
#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::page::PageSpec;
use crate::placement::{Frame, SheetLayout};

/// Maximum drawn page width.
const MAX_PANEL_W: f64 = 400.0;
/// Maximum drawn page height.
const MAX_PANEL_H: f64 = 520.0;
/// Margin around the page panel.
const MARGIN: f64 = 30.0;
/// Height of the label above the page.
const LABEL_H: f64 = 22.0;
/// Height of the caption below the page.
const CAPTION_H: f64 = 40.0;
/// Empty slots are outlined only up to this many per page.
const MAX_OUTLINED_SLOTS: usize = 1024;

/// Render page `page_index` of `sheet` as a standalone SVG document.
pub fn render_page_svg(page: &PageSpec, sheet: &SheetLayout, page_index: usize) -> String {
    let plan = sheet.plan();
    let (page_w, page_h) = page.dimensions();
    let scale = (MAX_PANEL_W / page_w).min(MAX_PANEL_H / page_h);
    let (panel_w, panel_h) = (page_w * scale, page_h * scale);
    let total_w = panel_w + 2.0 * MARGIN;
    let total_h = MARGIN + LABEL_H + panel_h + CAPTION_H + MARGIN;
    let origin_y = MARGIN + LABEL_H;
    let to_panel = |f: Frame| {
        let s = f.scaled(scale);
        Frame::new(MARGIN + s.x, origin_y + s.y, s.width, s.height)
    };

    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {:.1} {:.1}">"#,
        total_w as u32, total_h as u32, total_w, total_h
    ));
    svg.push('\n');
    svg.push_str(
        r##"<style>
  text { font-family: "Consolas", "DejaVu Sans Mono", "Courier New", monospace; }
  .label { font-size: 13px; font-weight: bold; fill: #333; }
  .caption { font-size: 11px; fill: #666; }
  .page { stroke: #999; stroke-width: 1; }
  .slot { fill: none; stroke: #aaa; stroke-width: 1; stroke-dasharray: 4,2; }
  .image { fill: #6ba3d6; stroke: #2c6faa; stroke-width: 1.5; }
  .index { font-size: 12px; fill: #fff; }
  .overflow { font-size: 14px; font-weight: bold; fill: #c0392b; }
</style>
"##,
    );

    let page_count = sheet.page_count().max(1);
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" class="label" text-anchor="middle">page {} of {}  {}×{}</text>"#,
        total_w / 2.0,
        MARGIN + 14.0,
        page_index + 1,
        page_count,
        trim(page_w),
        trim(page_h)
    ));
    svg.push('\n');

    svg.push_str(&format!(
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" class="page" fill="{}"/>"#,
        MARGIN, origin_y, panel_w, panel_h, page.background
    ));
    svg.push('\n');

    if sheet.overflow().is_some() {
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" class="overflow" text-anchor="middle">nothing fits</text>"#,
            total_w / 2.0,
            origin_y + panel_h / 2.0
        ));
        svg.push('\n');
    } else {
        let placed = sheet.page(page_index);
        let capacity = plan.capacity_per_page() as usize;
        for slot in placed.len()..capacity.min(MAX_OUTLINED_SLOTS) {
            if let Some(frame) = plan.cell_frame(slot) {
                push_rect(&mut svg, to_panel(frame), "slot");
            }
        }
        for placement in placed {
            let f = to_panel(placement.frame);
            push_rect(&mut svg, f, "image");
            svg.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" class="index" text-anchor="middle">{}</text>"#,
                f.x + f.width / 2.0,
                f.y + f.height / 2.0 + 4.0,
                placement.image_index
            ));
            svg.push('\n');
        }
    }

    let caption_y = origin_y + panel_h + 16.0;
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" class="caption" text-anchor="middle">{}×{} grid, cell {}×{}, capacity {}</text>"#,
        total_w / 2.0,
        caption_y,
        plan.columns(),
        plan.rows(),
        trim(plan.cell_width()),
        trim(plan.cell_height()),
        plan.capacity_per_page()
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" class="caption" text-anchor="middle">spacing {} h, {} v</text>"#,
        total_w / 2.0,
        caption_y + 16.0,
        trim(plan.horizontal_spacing()),
        trim(plan.vertical_spacing())
    ));
    svg.push('\n');

    svg.push_str("</svg>\n");
    svg
}

fn push_rect(svg: &mut String, f: Frame, class: &str) {
    svg.push_str(&format!(
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" class="{}"/>"#,
        f.x, f.y, f.width, f.height, class
    ));
    svg.push('\n');
}

/// Up to three decimals, trailing zeros dropped.
fn trim(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { String::from("0") } else { String::from(s) }
}
