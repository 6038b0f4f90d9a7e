pub mod facts;
pub mod poi_service;
pub mod scoring;
pub mod wikipedia;

pub use facts::{EncyclopediaSource, FactService, GraphFactSource};
pub use poi_service::PoiService;
pub use scoring::CandidateSelector;
pub use wikipedia::WikipediaClient;
