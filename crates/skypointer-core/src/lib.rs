pub mod calibration;
pub mod config;
pub mod device;
pub mod error;
pub mod feed;
pub mod geo;
pub mod hardware;
pub mod io;
pub mod paths;
pub mod ring;
pub mod sim;
pub mod stepper;
pub mod store;
pub mod tracker;

pub use device::Pointer;
pub use error::{PointerError, Result};
