pub mod error;
pub mod ids;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use error::*;
pub use ids::*;
pub use math::*;
