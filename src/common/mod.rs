mod raster;

pub use raster::{Dimensions, RasterImage};
