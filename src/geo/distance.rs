use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_MILES: f64 = 3959.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// `None` for NaN, infinite or out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let p = Self { lat, lng };
        p.is_valid().then_some(p)
    }

    /// Decodes the nullable `lat`/`lng` column pair.
    pub fn from_columns(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        Self::new(lat?, lng?)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance in miles.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().atan2((1.0 - h).sqrt())
}

#[derive(Debug, Clone)]
pub struct Candidate<I> {
    pub id: I,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<I> {
    pub id: I,
    pub distance_miles: f64,
}

/// Candidates within `max_distance` miles of `origin`, nearest first.
///
/// Candidates without a valid location are dropped rather than ranked last, and
/// equal distances keep their input order. An invalid origin ranks nothing.
pub fn rank<I>(
    origin: GeoPoint,
    candidates: impl IntoIterator<Item = Candidate<I>>,
    max_distance: f64,
) -> Vec<Ranked<I>> {
    if !origin.is_valid() {
        return Vec::new();
    }
    let mut ranked: Vec<Ranked<I>> = candidates
        .into_iter()
        .filter_map(|c| {
            let location = c.location.filter(GeoPoint::is_valid)?;
            let distance_miles = haversine_miles(origin, location);
            (distance_miles <= max_distance).then_some(Ranked {
                id: c.id,
                distance_miles,
            })
        })
        .collect();
    ranked.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
    ranked
}
