//! # Terrain
//!
//! Ground elevation sampled along the great circle between two points.

mod error;
mod profile;

pub use crate::{
    error::TerrainError,
    profile::{ProfileBuilder, ProfileSource, TerrainProfile, DEFAULT_SAMPLES},
};
