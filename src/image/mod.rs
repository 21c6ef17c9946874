//! Page and cell image buffers.
//!
//! - [`ImageU8`]: borrowed 8-bit grayscale view over a page (stride aware).
//! - [`ImageF32`]: owned float buffer in `[0, 1]` used by the cell enhancer.
//! - [`io`]: loading pages from disk or memory and writing JSON reports.

pub mod f32;
pub mod io;
pub mod traits;
pub mod u8;

pub use self::f32::ImageF32;
pub use self::io::GrayImageU8;
pub use self::traits::{ImageView, ImageViewMut};
pub use self::u8::ImageU8;
