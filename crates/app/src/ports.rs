//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside
//! world. They are defined here (in `app`) so that both the use-case layer
//! and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod button_events;
pub mod directory;
pub mod queue;
pub mod vendor;

pub use button_events::ButtonEventRepository;
pub use directory::{DeviceDirectory, GroupDirectory};
pub use queue::CommandQueue;
pub use vendor::VendorAdapter;
