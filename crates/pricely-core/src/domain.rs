//! Shared domain types for the aggregation & matching engine.
//!
//! The wire JSON for these types is deliberately tolerant (unknown fields
//! ignored via `#[serde(default)]` where relevant) while the in-memory model
//! stays strict: every variant of [`PlatformCredential`] carries exactly the
//! fields its platform's search call needs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One of the five supported storefronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Bigbasket,
    Blinkit,
    Instamart,
    Dmart,
    Zepto,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Bigbasket,
        Platform::Blinkit,
        Platform::Instamart,
        Platform::Dmart,
        Platform::Zepto,
    ];

    /// Wire/display name, matching the bit-exact response schema in §6.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Bigbasket => "Bigbasket",
            Platform::Blinkit => "Blinkit",
            Platform::Instamart => "Instamart",
            Platform::Dmart => "Dmart",
            Platform::Zepto => "Zepto",
        }
    }

    /// Credential-bundle key, matching the `<PLATFORM>` naming in §6
    /// (e.g. `credentials.DMART.serviceable`).
    #[must_use]
    pub fn credential_key(self) -> &'static str {
        match self {
            Platform::Bigbasket => "BIGBASKET",
            Platform::Blinkit => "BLINKIT",
            Platform::Instamart => "INSTAMART",
            Platform::Dmart => "DMART",
            Platform::Zepto => "ZEPTO",
        }
    }
}

/// Resolves `(lat, lon)` into a canonical location, produced by the Geocoder
/// and immutable within a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDescriptor {
    pub lat: f64,
    pub lon: f64,
    pub formatted_address: String,
    pub postal_code: String,
    pub place_id: String,
}

/// Per-platform credential blob. Every field required for that platform's
/// search call must be present, or the blob is treated as absent and
/// re-acquired.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "platform")]
pub enum PlatformCredential {
    Bigbasket {
        auth_cookies: HashMap<String, String>,
        headers: HashMap<String, String>,
        #[serde(rename = "buildId")]
        build_id: String,
        lat: f64,
        lon: f64,
    },
    Blinkit {
        device_id: String,
        app_version: String,
        auth_key: String,
        cookies: HashMap<String, String>,
        lat: f64,
        lon: f64,
    },
    Instamart {
        cookies: HashMap<String, String>,
        primary_store_id: String,
        secondary_store_id: Option<String>,
        non_serviceable: bool,
    },
    Dmart {
        place_id: String,
        serviceable: bool,
    },
    Zepto {
        store_id: String,
        device_id: String,
        session_id: String,
        xsrf_token: String,
        non_serviceable: bool,
    },
}

impl PlatformCredential {
    #[must_use]
    pub fn platform(&self) -> Platform {
        match self {
            PlatformCredential::Bigbasket { .. } => Platform::Bigbasket,
            PlatformCredential::Blinkit { .. } => Platform::Blinkit,
            PlatformCredential::Instamart { .. } => Platform::Instamart,
            PlatformCredential::Dmart { .. } => Platform::Dmart,
            PlatformCredential::Zepto { .. } => Platform::Zepto,
        }
    }

    /// True when this credential declares the platform non-serviceable for
    /// the location it was acquired under.
    #[must_use]
    pub fn is_non_serviceable(&self) -> bool {
        match self {
            PlatformCredential::Instamart { non_serviceable, .. }
            | PlatformCredential::Zepto { non_serviceable, .. } => *non_serviceable,
            PlatformCredential::Dmart { serviceable, .. } => !*serviceable,
            PlatformCredential::Bigbasket { .. } | PlatformCredential::Blinkit { .. } => false,
        }
    }
}

/// Mapping from platform to its credential, owned by the caller between
/// requests.
pub type CredentialBundle = HashMap<Platform, PlatformCredential>;

/// Uniform schema produced by every platform handler.
///
/// `product_url` uniquely addresses the listing within its platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListing {
    pub platform: Platform,
    pub name: String,
    /// Smallest meaningful price unit for the platform (effectively whole
    /// rupees here — see `pricely_core::quantity::parse_price_minor`).
    pub price_minor: Option<i64>,
    pub image_url: String,
    pub product_url: String,
    pub raw_quantity: String,
}

/// A quantity normalized into one of the three canonical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuantity {
    pub value: f64,
    pub unit: CanonicalUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanonicalUnit {
    Ml,
    G,
    Count,
}

/// One store's offer within a [`ProductGroup`], in the bit-exact response
/// shape from §6 (`price` as a list of `{store, price, quantity, url}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub store: Platform,
    pub price: Option<i64>,
    pub quantity: String,
    pub url: String,
}

/// A cluster of listings across stores judged to be the same real-world SKU
/// (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductGroup {
    pub representative_name: String,
    pub representative_image: String,
    pub offers: Vec<Offer>,
    pub min_price: Option<i64>,
    pub min_quantity_value: Option<f64>,
    pub query_similarity: f64,
    pub store_count: usize,
}

/// Top-level result of a comparison call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub groups: Vec<ProductGroup>,
    pub credentials: CredentialBundle,
}
