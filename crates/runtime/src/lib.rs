pub mod event_bus;
pub mod game;
pub mod panorama;
pub mod sequencer;
pub mod session;

pub use event_bus::*;
pub use game::*;
pub use panorama::*;
pub use sequencer::*;
pub use session::*;
