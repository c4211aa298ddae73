//! Raster dimension probing for local images.
//!
//! The markdown renderer adds `width`/`height` to `<img>` tags that point into
//! the configured image directory, so browsers can reserve layout space before
//! the lazy-loaded file arrives. Probing goes through the [`ImageProbe`] trait;
//! [`ImageCrateProbe`] is the production implementation.

pub mod backend;
pub mod rust_backend;

pub use backend::{Dimensions, ImageProbe, ProbeError};
pub use rust_backend::ImageCrateProbe;
