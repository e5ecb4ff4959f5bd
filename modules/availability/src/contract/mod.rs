pub mod client;
pub mod error;
pub mod model;

pub use client::AvailabilityApi;
pub use error::{AvailabilityError, ErrorClass};
pub use model::*;
