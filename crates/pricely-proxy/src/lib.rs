pub mod client;
pub mod error;

pub use client::{cookie_header, parse_cookie_header, ProxyClient, ProxyMethod, ProxyResponse};
pub use error::ProxyError;
