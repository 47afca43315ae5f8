pub mod events;
pub mod frames;
pub mod methods;

pub use events::LiveEvent;
