mod client;
mod measurements;

pub use client::Client;
pub use measurements::{MeasurementField, Measurements};
pub(crate) use measurements::non_empty;
