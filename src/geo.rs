//! Great-circle geometry and wind projection
//!
//! Pure functions used by the decision engine: initial bearing, haversine
//! distance and the headwind component of a wind vector along a route.

use crate::models::Coordinate;

/// Mean Earth radius used by every distance in the service
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Fold an angle into `[0, 360)`
///
/// `rem_euclid` may round a tiny negative input up to exactly 360, which is
/// folded back to 0.
#[must_use]
pub fn normalize_deg(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Initial great-circle bearing from `origin` to `dest`, clockwise from north
///
/// Identical points have no defined bearing; the result is then 0.
#[must_use]
pub fn bearing_deg(origin: &Coordinate, dest: &Coordinate) -> f64 {
    let phi1 = origin.lat.to_radians();
    let phi2 = dest.lat.to_radians();
    let delta_lon = (dest.lon - origin.lon).to_radians();

    let y = delta_lon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lon.cos();

    normalize_deg(y.atan2(x).to_degrees())
}

/// Haversine distance in meters
#[must_use]
pub fn distance_m(a: &Coordinate, b: &Coordinate) -> f64 {
    let km = haversine::distance(
        haversine::Location {
            latitude: a.lat,
            longitude: a.lon,
        },
        haversine::Location {
            latitude: b.lat,
            longitude: b.lon,
        },
        haversine::Units::Kilometers,
    );
    km * (EARTH_RADIUS_M / 6371.0)
}

/// Component of the wind opposing travel along `route_bearing_deg`
///
/// `wind_from_deg` is the direction the wind blows from. Positive values
/// are headwind, negative values tailwind.
#[must_use]
pub fn headwind_mph(wind_from_deg: f64, route_bearing_deg: f64, wind_speed_mph: f64) -> f64 {
    let relative = normalize_deg(wind_from_deg - route_bearing_deg).to_radians();
    wind_speed_mph * relative.cos()
}
