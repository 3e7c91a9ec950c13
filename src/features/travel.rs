//! Travel distance between host cities

use crate::Coordinates;

/// Mean Earth radius (IUGG), km
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance in km (haversine formula)
pub fn great_circle_km(from: Coordinates, to: Coordinates) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Distance travelled into each game from the previous game's host city.
/// `None` for the first game or when either city has no coordinates.
pub fn shifted_distances(coords: &[Option<Coordinates>]) -> Vec<Option<f64>> {
    (0..coords.len())
        .map(|k| match (k.checked_sub(1).and_then(|p| coords[p]), coords[k]) {
            (Some(prev), Some(cur)) => Some(great_circle_km(prev, cur)),
            _ => None,
        })
        .collect()
}
