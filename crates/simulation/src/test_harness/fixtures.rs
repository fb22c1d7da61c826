//! Building factories for hand-placed test populations.

use crate::buildings::{Building, BuildingId, GeoPoint, InspectionDate, StructuralType};

/// Reference point for test layouts.
pub const TEST_CENTER: GeoPoint = GeoPoint::new(41.0082, 28.9784);

/// A building with an explicit profile.
pub fn building(
    id: u32,
    position: GeoPoint,
    structural_type: StructuralType,
    floors: u8,
    year_built: u16,
) -> Building {
    Building {
        id: BuildingId(id),
        name: format!("Test Building {id}"),
        position,
        floors,
        year_built,
        structural_type,
        last_inspection: InspectionDate {
            year: 2024,
            month: 6,
            day: 1,
        },
        sensor_id: format!("TEST-{id:04}"),
    }
}

/// Reinforced concrete, 3 floors, built 2005: vulnerability 1.0.
pub fn uniform_building(id: u32, position: GeoPoint) -> Building {
    building(id, position, StructuralType::ReinforcedConcrete, 3, 2005)
}

/// Building 0 at `center`, the rest evenly spaced on a ring of `radius_km`.
pub fn cluster(center: GeoPoint, count: u32, radius_km: f64) -> Vec<Building> {
    let ring = count.saturating_sub(1).max(1);
    (0..count)
        .map(|id| {
            if id == 0 {
                return uniform_building(0, center);
            }
            let angle = std::f64::consts::TAU * f64::from(id - 1) / f64::from(ring);
            let position = center.offset_km(radius_km * angle.cos(), radius_km * angle.sin());
            uniform_building(id, position)
        })
        .collect()
}

/// `count` buildings due east of `origin`, `spacing_km` apart, starting at
/// the origin itself.
pub fn line_east(origin: GeoPoint, count: u32, spacing_km: f64) -> Vec<Building> {
    (0..count)
        .map(|id| uniform_building(id, origin.offset_km(f64::from(id) * spacing_km, 0.0)))
        .collect()
}
