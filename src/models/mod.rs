pub mod drug;
pub mod enums;
pub mod result;

pub use drug::*;
pub use enums::*;
pub use result::*;
