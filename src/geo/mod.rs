pub mod distance;
pub mod geocoding;

pub use distance::{rank, Candidate, GeoPoint};
pub use geocoding::{geocode_all, Geocoder, HttpGeocoder};
