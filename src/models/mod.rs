pub mod enums;
pub mod scan;

pub use enums::*;
pub use scan::*;
