pub mod balloon;
pub mod focus;
pub mod registry;

pub use balloon::*;
pub use focus::*;
pub use registry::*;
