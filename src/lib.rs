//! Photo sheet layout: place a list of images on fixed-size paper pages.
//!
//! The geometry core does no pixel work and no I/O, and builds under `no_std`.
//! Renderers consume the same [`SheetLayout`] so an on-screen
//! preview and an exported document line up exactly.
//!
//! # Modules
//!
//! - [`page`] — Paper size, orientation, decorations, units
//! - [`layout`] — Layout modes (Manual, Auto, Grid) and plan computation
//! - [`placement`] — Page/cell assignment for every image
//! - [`color`] — sRGB colors and color string parsing
//! - `render` — Async renderer, raster surface, PDF export (feature `render`, `pdf`)
//! - `svg` — Wireframe SVG of a planned page (feature `svg`)

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod color;
pub mod layout;
pub mod page;
pub mod placement;

#[cfg(feature = "render")]
pub mod render;

#[cfg(feature = "svg")]
pub mod svg;

pub use color::{Color, ColorParseError};
pub use layout::{LayoutError, LayoutPlan, Mode, Overflow, compute_layout};
pub use page::{Orientation, PT_PER_INCH, PX_PER_INCH, PageSpec, PaperSize};
#[cfg(feature = "alloc")]
pub use placement::{SheetLayout, plan_placements};
pub use placement::{Frame, Placement, Placements};
