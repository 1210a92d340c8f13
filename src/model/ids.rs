//! Newtype IDs for dataset elements.
//!
//! Newtypes keep the different kinds of IDs from being mixed up, e.g. passing
//! an image ID where a category ID is expected fails to compile.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id! {
    /// A unique identifier for an image in a dataset.
    ImageId
}

define_id! {
    /// A unique identifier for an annotation in a dataset.
    AnnotationId
}

define_id! {
    /// A unique identifier for a category in a dataset.
    CategoryId
}
