pub mod error;
pub mod image;
pub mod options;

pub use error::{ErrorKind, ScanError};
pub use image::DiskImage;
pub use options::WalkOptions;
