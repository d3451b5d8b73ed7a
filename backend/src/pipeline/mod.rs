//! Image-collection composition pipeline.
//!
//! Every stage is a pure transform over immutable values:
//!
//! ```text
//! ImageCollection ─filter(date, AOI)─► harmonize ─merge─► derive indices
//!        ─median─► Composite ─[Mask::apply]─► render ─► RenderedLayer
//! ```

pub mod collection;
pub mod composite;
pub mod harmonize;
pub mod indices;
pub mod mask;
pub mod render;

pub use collection::{Filter, ImageCollection, Step};
pub use composite::{composite, median, median_reduce, Composite};
pub use harmonize::harmonize;
pub use indices::{derive_indices, normalized_difference};
pub use mask::{Mask, MaskCell};
pub use render::{render, RenderedLayer, TRANSPARENT};
