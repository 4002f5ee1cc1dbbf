pub mod conversion;
pub mod raster;
