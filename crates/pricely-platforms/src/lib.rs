//! The five storefront handlers, sharing a common
//! credential-acquisition retry pattern from [`retry`].

pub mod bigbasket;
pub mod blinkit;
pub mod dmart;
pub mod error;
pub mod instamart;
mod retry;
pub mod zepto;

pub use error::PlatformError;

use pricely_core::{LocationDescriptor, Platform, PlatformCredential, ProductListing};
use pricely_proxy::ProxyClient;

/// Dispatch a search to the handler for `platform`. Every handler shares the
/// `search(query, location, credential?) -> (listings, credential?)`
/// contract from §4.4.
pub async fn search(
    platform: Platform,
    proxy: &ProxyClient,
    query: &str,
    location: &LocationDescriptor,
    credential: Option<PlatformCredential>,
    max_attempts: u32,
) -> (Vec<ProductListing>, Option<PlatformCredential>) {
    match platform {
        Platform::Bigbasket => bigbasket::search(proxy, query, location, credential, max_attempts).await,
        Platform::Blinkit => blinkit::search(proxy, query, location, credential, max_attempts).await,
        Platform::Instamart => instamart::search(proxy, query, location, credential, max_attempts).await,
        Platform::Dmart => dmart::search(proxy, query, location, credential, max_attempts).await,
        Platform::Zepto => zepto::search(proxy, query, location, credential, max_attempts).await,
    }
}
