pub mod errors;
mod registry;
pub mod token;
mod traits;

pub use registry::*;
pub use traits::*;
