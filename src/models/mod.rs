pub mod coordinates;
pub mod decision;
pub mod fact;
pub mod poi;

pub use coordinates::{round_display_distance, Coordinates};
pub use decision::{Decision, PoiWithStory, TasteProfile};
pub use fact::{dedup_facts, Fact, FactSource, FactSourceKind, PoiWithFacts};
pub use poi::{EncyclopediaRef, Poi, PoiSource};
