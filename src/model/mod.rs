mod geo;
mod lang;

pub use geo::GeoRecord;
pub use lang::{normalize_lang, pick_name};
