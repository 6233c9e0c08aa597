pub mod client;
pub mod error;

pub use client::GeocoderClient;
pub use error::GeocoderError;
