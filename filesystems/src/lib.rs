// On-disk filesystem interpretation
pub mod fat16;

#[doc(hidden)]
pub mod test_helpers;

pub use fat16::{interpret, Fat16Walker, TraversalReport};
