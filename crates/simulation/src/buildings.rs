use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine distance (km).
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Stable identity of a monitored building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B-{:03}", self.0)
    }
}

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Point displaced by the given east/north offsets in kilometres.
    pub fn offset_km(&self, east_km: f64, north_km: f64) -> GeoPoint {
        let km_per_deg_lat = 111.32;
        let km_per_deg_lng = km_per_deg_lat * self.lat.to_radians().cos().max(1e-6);
        GeoPoint {
            lat: self.lat + north_km / km_per_deg_lat,
            lng: self.lng + east_km / km_per_deg_lng,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructuralType {
    ReinforcedConcrete,
    Masonry,
    Steel,
    Timber,
}

impl StructuralType {
    pub const ALL: [StructuralType; 4] = [
        StructuralType::ReinforcedConcrete,
        StructuralType::Masonry,
        StructuralType::Steel,
        StructuralType::Timber,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StructuralType::ReinforcedConcrete => "reinforced-concrete",
            StructuralType::Masonry => "masonry",
            StructuralType::Steel => "steel",
            StructuralType::Timber => "timber",
        }
    }
}

/// Calendar date of the last structural inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InspectionDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl fmt::Display for InspectionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A monitored building. Immutable after the population is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
    pub position: GeoPoint,
    pub floors: u8,
    pub year_built: u16,
    pub structural_type: StructuralType,
    pub last_inspection: InspectionDate,
    pub sensor_id: String,
}

/// The fixed building population of one simulated world, ordered by id.
#[derive(Resource, Debug, Clone, Default)]
pub struct BuildingRoster {
    buildings: Vec<Building>,
}

impl BuildingRoster {
    pub fn new(mut buildings: Vec<Building>) -> Self {
        buildings.sort_by_key(|b| b.id);
        buildings.dedup_by_key(|b| b.id);
        Self { buildings }
    }

    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|idx| &self.buildings[idx])
    }

    pub fn contains(&self, id: BuildingId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = BuildingId> + '_ {
        self.buildings.iter().map(|b| b.id)
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}
