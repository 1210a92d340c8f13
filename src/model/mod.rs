//! Normalized dataset model shared by all parsers.
//!
//! Every format-specific parser decodes its source into these types, giving
//! downstream code one representation to work with.
//!
//! # Design Principles
//!
//! 1. **Type safety**: Newtype IDs and coordinate-space markers turn mixups
//!    (image vs. category ID, pixel vs. normalized box) into compile errors.
//!
//! 2. **Canonical layout**: Boxes are always XYXY in pixel space. Formats
//!    that store XYWH or normalized coordinates convert on the way in.
//!
//! 3. **Permissive construction**: Degenerate data (zero-area boxes, negative
//!    coordinates) stays representable so parsers can surface it in reported
//!    errors instead of panicking.

mod bbox;
mod ids;
mod record;

pub use bbox::{BBox, Norm, Pixel};
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use record::{Annotation, Category, Dataset, DatasetInfo, Image};
