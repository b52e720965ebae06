use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entities::rider::Rider;

/// How the rider list is ordered on the search page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortCriterion {
    #[default]
    Price,
    Eta,
    Rating,
    Distance,
}

impl SortCriterion {
    pub const ALL: [SortCriterion; 4] = [
        SortCriterion::Price,
        SortCriterion::Eta,
        SortCriterion::Rating,
        SortCriterion::Distance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortCriterion::Price => "price",
            SortCriterion::Eta => "eta",
            SortCriterion::Rating => "rating",
            SortCriterion::Distance => "distance",
        }
    }

    /// Primary key, then the documented tie-break, then id so the order is total
    pub fn compare(self, a: &Rider, b: &Rider) -> Ordering {
        let primary = match self {
            SortCriterion::Price => a.fare.cmp(&b.fare).then(a.eta_min.cmp(&b.eta_min)),
            SortCriterion::Eta => a.eta_min.cmp(&b.eta_min).then(a.fare.cmp(&b.fare)),
            SortCriterion::Rating => b.rating.total_cmp(&a.rating).then(a.fare.cmp(&b.fare)),
            SortCriterion::Distance => a
                .distance_km
                .total_cmp(&b.distance_km)
                .then(a.eta_min.cmp(&b.eta_min)),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" | "fare" => Ok(SortCriterion::Price),
            "eta" => Ok(SortCriterion::Eta),
            "rating" => Ok(SortCriterion::Rating),
            "distance" => Ok(SortCriterion::Distance),
            other => Err(format!("Unknown sort criterion: {}", other)),
        }
    }
}

pub fn rank(riders: &[Rider], criterion: SortCriterion) -> Vec<Rider> {
    let mut ranked = riders.to_vec();
    ranked.sort_by(|a, b| criterion.compare(a, b));
    ranked
}

/// Cheapest rider (ETA tie-broken), whatever order is on display
pub fn best_match(riders: &[Rider]) -> Option<Rider> {
    riders
        .iter()
        .min_by(|a, b| SortCriterion::Price.compare(a, b))
        .cloned()
}
