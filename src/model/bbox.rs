//! Bounding boxes in canonical XYXY format, tagged by coordinate space.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// Marker type for pixel coordinates (absolute positions within an image,
/// (0, 0) at the top-left corner).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for normalized coordinates (fractions of the image dimensions,
/// 0.0 to 1.0).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Norm {}

/// An axis-aligned bounding box in XYXY order (xmin, ymin, xmax, ymax).
///
/// The `S` parameter is either [`Pixel`] or [`Norm`], so boxes from different
/// coordinate spaces cannot be combined without an explicit conversion.
///
/// The constructor does NOT enforce xmin <= xmax or ymin <= ymax. Degenerate
/// boxes from malformed sources stay representable so callers can report them
/// instead of panicking mid-parse.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox<S> {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    _space: PhantomData<S>,
}

impl<S> BBox<S> {
    /// Creates a box from explicit corner coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    /// Creates a box from XYWH (top-left corner plus size), the layout COCO
    /// annotations use.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    /// Width of the box. Negative when the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the box. Negative when the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Area of the box. Negative when the box is malformed.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True if every coordinate is finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    /// True if min <= max on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }

    /// The box as an `[xmin, ymin, xmax, ymax]` array.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

impl BBox<Norm> {
    /// Scales normalized coordinates up to pixel coordinates for an image of
    /// the given size.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBox<Pixel> {
        BBox::from_xyxy(
            self.xmin * image_width,
            self.ymin * image_height,
            self.xmax * image_width,
            self.ymax * image_height,
        )
    }
}

impl BBox<Pixel> {
    /// Scales pixel coordinates down to normalized coordinates for an image
    /// of the given size.
    pub fn to_norm(&self, image_width: f64, image_height: f64) -> BBox<Norm> {
        BBox::from_xyxy(
            self.xmin / image_width,
            self.ymin / image_height,
            self.xmax / image_width,
            self.ymax / image_height,
        )
    }
}

impl<S> fmt::Debug for BBox<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BBox")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl<S> Default for BBox<S> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

// Boxes serialize as a bare [xmin, ymin, xmax, ymax] array. Hand-written so
// the impls carry no bound on the marker type.
impl<S> Serialize for BBox<S> {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de, S> Deserialize<'de> for BBox<S> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [xmin, ymin, xmax, ymax] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(BBox::from_xyxy(xmin, ymin, xmax, ymax))
    }
}
