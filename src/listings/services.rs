use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{FeedListing, StoreListing};
use crate::feed::types::round_tenth;
use crate::feed::{build_listing_drafts, AnimalType, FeedEstimate, FeedListingDraft};
use crate::geo::{rank, Candidate, GeoPoint};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NearbySort {
    #[default]
    Distance,
    PriceLow,
    PriceHigh,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyListing {
    #[serde(flatten)]
    pub listing: FeedListing,
    pub store_name: String,
    pub store_location: GeoPoint,
    pub distance_miles: f64,
}

/// Listings whose store lies within `max_distance` miles of `origin`.
/// Stores without usable coordinates never appear. Price sorts are stable over distance order.
pub fn search_nearby(
    origin: GeoPoint,
    listings: Vec<StoreListing>,
    max_distance: f64,
    sort: NearbySort,
) -> Vec<NearbyListing> {
    let candidates = listings.iter().enumerate().map(|(idx, l)| Candidate {
        id: idx,
        location: l.store_location,
    });
    let ranked = rank(origin, candidates, max_distance);

    let mut slots: Vec<Option<StoreListing>> = listings.into_iter().map(Some).collect();
    let mut out: Vec<NearbyListing> = ranked
        .into_iter()
        .filter_map(|r| {
            let sl = slots[r.id].take()?;
            Some(NearbyListing {
                store_location: sl.store_location?,
                listing: sl.listing,
                store_name: sl.store_name,
                distance_miles: round_tenth(r.distance_miles),
            })
        })
        .collect();

    match sort {
        NearbySort::Distance => {}
        NearbySort::PriceLow => {
            out.sort_by(|a, b| a.listing.unit_price.total_cmp(&b.listing.unit_price))
        }
        NearbySort::PriceHigh => {
            out.sort_by(|a, b| b.listing.unit_price.total_cmp(&a.listing.unit_price))
        }
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
pub enum DraftRejection {
    NothingToList,
    Unpriced(Vec<AnimalType>),
    NegativePrice(Vec<AnimalType>),
}

impl DraftRejection {
    pub fn message(&self) -> String {
        let names = |v: &[AnimalType]| {
            v.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", ")
        };
        match self {
            DraftRejection::NothingToList => "estimate produced no feed to list".into(),
            DraftRejection::Unpriced(v) => format!("set a price above zero for: {}", names(v)),
            DraftRejection::NegativePrice(v) => format!("prices cannot be negative: {}", names(v)),
        }
    }
}

/// Builds drafts and applies the form rules: at least one draft, every draft priced above zero.
pub fn priced_drafts(
    estimate: &FeedEstimate,
    prices: &HashMap<AnimalType, f64>,
) -> Result<Vec<FeedListingDraft>, DraftRejection> {
    let drafts = build_listing_drafts(estimate, prices);
    if drafts.is_empty() {
        return Err(DraftRejection::NothingToList);
    }
    let negative: Vec<AnimalType> = drafts
        .iter()
        .filter(|d| d.unit_price < 0.0 || !d.unit_price.is_finite())
        .map(|d| d.animal_type)
        .collect();
    if !negative.is_empty() {
        return Err(DraftRejection::NegativePrice(negative));
    }
    let unpriced: Vec<AnimalType> = drafts
        .iter()
        .filter(|d| d.unit_price == 0.0)
        .map(|d| d.animal_type)
        .collect();
    if !unpriced.is_empty() {
        return Err(DraftRejection::Unpriced(unpriced));
    }
    Ok(drafts)
}

/// Source ids recorded on a listing, sorted for stable storage.
pub fn source_ids(items: &[crate::inventory::SupplyItem]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    ids.sort();
    ids
}
