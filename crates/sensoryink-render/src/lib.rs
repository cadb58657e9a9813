//! CPU raster backend for the sensory ink engine.
//!
//! Implements the core's `RenderTarget` contract over an RGBA8 pixel
//! buffer and provides the surface factory that powers 2x PNG export.

pub mod raster;

pub use raster::{RasterSurfaceProvider, RasterTarget};
