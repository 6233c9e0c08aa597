//! Shared application state threaded through every route, generic over
//! the content-store backend so the same router builder serves both the
//! Postgres backend in `main` and the in-memory fake used by this
//! crate's own route tests.

use std::sync::Arc;

use pricely_content::ContentStore;
use pricely_core::AppConfig;
use pricely_geocoder::GeocoderClient;
use pricely_orchestrator::Orchestrator;

pub struct AppState<C: ContentStore> {
    pub content: Arc<C>,
    pub orchestrator: Arc<Orchestrator>,
    /// Held separately from `orchestrator` — `/autocomplete` (§4.7) talks to
    /// the Geocoder directly and has no business going through the
    /// search-comparison engine.
    pub geocoder: Arc<GeocoderClient>,
    pub config: Arc<AppConfig>,
}

impl<C: ContentStore> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            content: Arc::clone(&self.content),
            orchestrator: Arc::clone(&self.orchestrator),
            geocoder: Arc::clone(&self.geocoder),
            config: Arc::clone(&self.config),
        }
    }
}
