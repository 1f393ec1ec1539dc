//! Distance from each listing to the city reference point.

use geo::{Distance, Geodesic, Point};
use tartu_housing_dataset_models::Coordinates;

/// Geodesic distance on the WGS84 ellipsoid, in meters.
#[must_use]
pub fn distance_m(from: Coordinates, to: Coordinates) -> f64 {
    Geodesic.distance(
        Point::new(from.longitude, from.latitude),
        Point::new(to.longitude, to.latitude),
    )
}
