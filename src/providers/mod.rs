pub mod overpass;
pub mod places;
pub mod wikidata;

pub use overpass::OverpassProvider;
pub use places::PlacesProvider;
pub use wikidata::WikidataProvider;

use crate::error::Result;
use crate::models::{Coordinates, Poi};
use async_trait::async_trait;

/// Uniform seam over the heterogeneous geo/knowledge providers.
/// Implementations translate the meter radius into their native parameter
/// and bound every request with the configured per-call timeout. Failure
/// isolation lives in the fan-out, not here: fetch errors are real errors.
#[async_trait]
pub trait PoiProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        lang: &str,
    ) -> Result<Vec<Poi>>;
}

/// Clip a provider error body for logging.
pub fn snippet(body: &str, max_bytes: usize) -> &str {
    if body.len() <= max_bytes {
        return body;
    }
    // Back off to a char boundary
    let mut end = max_bytes;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
