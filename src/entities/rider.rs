use serde::{Deserialize, Serialize};

/// A driver offering seats. Records come from the static catalog and are
/// embedded by value into rides, so they never change after allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rider {
    pub id: String,
    pub name: String,
    pub vehicle: String,
    pub plate: String,
    /// 0.0 to 5.0
    pub rating: f64,
    pub trips: u32,
    pub distance_km: f64,
    pub eta_min: u32,
    /// Per seat, in rupees
    pub fare: u32,
    pub experience_years: u32,
    pub has_helmet: bool,
}

struct CatalogEntry {
    id: &'static str,
    name: &'static str,
    vehicle: &'static str,
    plate: &'static str,
    rating: f64,
    trips: u32,
    distance_km: f64,
    eta_min: u32,
    fare: u32,
    experience_years: u32,
    has_helmet: bool,
}

const CATALOG: [CatalogEntry; 6] = [
    CatalogEntry { id: "r1", name: "Aman K.", vehicle: "Hero Splendor", plate: "RJ14 BK 4021", rating: 4.9, trips: 1240, distance_km: 0.8, eta_min: 3, fare: 48, experience_years: 6, has_helmet: true },
    CatalogEntry { id: "r2", name: "Neeraj S.", vehicle: "TVS Star City", plate: "RJ45 AC 9982", rating: 4.8, trips: 980, distance_km: 1.2, eta_min: 5, fare: 46, experience_years: 4, has_helmet: true },
    CatalogEntry { id: "r3", name: "Ravi P.", vehicle: "Bajaj Platina", plate: "RJ27 DD 2156", rating: 4.7, trips: 1523, distance_km: 1.8, eta_min: 7, fare: 45, experience_years: 7, has_helmet: false },
    CatalogEntry { id: "r4", name: "Imran A.", vehicle: "Honda Shine", plate: "RJ14 CF 7734", rating: 4.9, trips: 2105, distance_km: 2.4, eta_min: 9, fare: 52, experience_years: 9, has_helmet: true },
    CatalogEntry { id: "r5", name: "Sunil M.", vehicle: "Hero HF Deluxe", plate: "RJ20 GA 3318", rating: 4.6, trips: 640, distance_km: 2.1, eta_min: 8, fare: 44, experience_years: 3, has_helmet: true },
    CatalogEntry { id: "r6", name: "Karan V.", vehicle: "Bajaj Pulsar 150", plate: "RJ09 EH 5590", rating: 4.8, trips: 1112, distance_km: 1.5, eta_min: 6, fare: 47, experience_years: 5, has_helmet: false },
];

impl From<&CatalogEntry> for Rider {
    fn from(e: &CatalogEntry) -> Self {
        Rider {
            id: e.id.to_string(),
            name: e.name.to_string(),
            vehicle: e.vehicle.to_string(),
            plate: e.plate.to_string(),
            rating: e.rating,
            trips: e.trips,
            distance_km: e.distance_km,
            eta_min: e.eta_min,
            fare: e.fare,
            experience_years: e.experience_years,
            has_helmet: e.has_helmet,
        }
    }
}

/// The fixed rider directory, in catalog order
pub fn catalog() -> Vec<Rider> {
    CATALOG.iter().map(Rider::from).collect()
}

pub fn find(id: &str) -> Option<Rider> {
    CATALOG.iter().find(|e| e.id == id).map(Rider::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_non_empty_with_unique_ids() {
        let riders = catalog();
        assert_eq!(riders.len(), 6);

        let mut ids: Vec<_> = riders.iter().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), riders.len());
    }

    #[test]
    fn test_catalog_ratings_in_range() {
        assert!(catalog().iter().all(|r| (0.0..=5.0).contains(&r.rating)));
    }

    #[test]
    fn test_find() {
        assert_eq!(find("r3").map(|r| r.fare), Some(45));
        assert!(find("r99").is_none());
    }
}
