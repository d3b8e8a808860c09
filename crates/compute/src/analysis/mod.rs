pub mod cluster;
pub mod descent;
pub mod landing;
pub mod scoring;

pub use cluster::*;
pub use descent::*;
pub use landing::*;
pub use scoring::*;
