pub mod engine;
pub mod timestep;

pub use engine::{HandoffSync, Ownership};
pub use timestep::FixedTimestep;
