//! # Geodesy
//!
//! Distance, bearing, and path sampling between points on the Earth.
//!
//! Fast routines use a spherical earth of radius
//! [`MEAN_EARTH_RADIUS`]. [`precise_distance_m`] solves the inverse
//! problem on the WGS-84 ellipsoid and quietly falls back to the
//! spherical result when that solution does not converge.

mod angle;
pub mod constants;
mod great_circle;
mod haversine;
mod linspace;
mod point;
mod vincenty;

pub use crate::{
    angle::{heading_diff_deg, normalize_deg, wrap180},
    constants::MEAN_EARTH_RADIUS,
    great_circle::GreatCircleIter,
    haversine::{bearing_deg, distance_m},
    linspace::linspace,
    point::GeoPoint,
    vincenty::{precise_distance_m, vincenty_distance_m},
};
pub use geo;
