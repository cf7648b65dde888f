pub mod comparator;
pub mod display;
pub mod pathology;
pub mod safety;
pub mod staging;
pub mod trends;

pub use comparator::*;
pub use display::*;
pub use pathology::*;
pub use safety::*;
pub use staging::*;
pub use trends::*;
