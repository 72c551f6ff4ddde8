//! javaseis - JavaSeis dataset reader/writer
//!
//! A pure Rust implementation of the JavaSeis seismic data format: a
//! multidimensional, sparsely-populated, frame-oriented on-disk container.
//!
//! # Features
//!
//! - 3-D to 5-D framework axes with logical and physical coordinate grids
//! - Sparse frames tracked through an on-disk trace map
//! - Bulk data split across fixed-size extents, optionally on secondary
//!   storage roots
//! - Float32 and fixed-point int16 trace formats
//! - Typed trace headers at fixed byte offsets
//! - Rectangular bulk reads and writes over the logical grid
//!
//! # Example
//!
//! ```rust,ignore
//! use javaseis::{CreateOptions, Dataset};
//!
//! # fn example() -> javaseis::Result<()> {
//! let mut ds = Dataset::create("/data/survey.js", CreateOptions::new(&[1001, 40, 6]))?;
//!
//! let mut trcs = ds.alloc_frame_trcs();
//! let mut hdrs = ds.alloc_frame_hdrs();
//! let fold = ds.read_frame(1, &mut trcs, &mut hdrs)?;
//! ds.regularize(&mut trcs, &mut hdrs, fold)?;
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod dataset;
pub mod error;
pub mod header;
pub mod io;
pub mod layout;
pub mod map;
pub mod metadata;
pub mod parset;
pub mod props;
pub mod range;
pub mod types;
pub mod utils;

// Re-exports
pub use compression::{codec_for, Float32Codec, Int16Codec, TraceCodec};
pub use dataset::{copy, mv, CreateOptions, Dataset};
pub use error::{JsError, Result};
pub use layout::Extent;
pub use map::TraceMap;
pub use metadata::FileProperties;
pub use props::{AxisLabelDict, HeaderSchema};
pub use range::Span;
pub use types::{
    Axis, DataProperty, Endianness, Geometry, PropertyFormat, TraceFormat, TraceProperty,
    TracePropertyDef, TraceType,
};

/// Version of this implementation
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JavaSeis format version written to new datasets
pub const FORMAT_VERSION: &str = metadata::JAVASEIS_VERSION;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions() {
        assert!(!CRATE_VERSION.is_empty());
        assert_eq!(FORMAT_VERSION, "2006.3");
    }
}
