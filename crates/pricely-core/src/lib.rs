pub mod api_key;
pub mod app_config;
pub mod config;
pub mod domain;
pub mod error;
pub mod quantity;
pub mod wire;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{
    CanonicalUnit, CredentialBundle, LocationDescriptor, Offer, ParsedQuantity, Platform,
    PlatformCredential, ProductGroup, ProductListing, SearchResult,
};
pub use error::ConfigError;
pub use wire::{credentials_from_wire, credentials_to_wire, platform_from_wire_key};
