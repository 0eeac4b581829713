//! Shared raster algorithms: kernel construction, 2-D convolution, and
//! bilinear resampling. The transform nodes compose these rather than
//! reimplementing pixel loops.

pub mod convolve;
pub mod kernel;
pub mod resample;

pub use convolve::{convolve, reflect};
pub use kernel::Kernel;
pub use resample::{resize_bilinear, sample_bilinear};
