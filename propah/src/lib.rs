//! # Line of sight
//!
//! `propah` decides whether a refracted line of sight between two
//! points clears the terrain in between.

mod error;
pub mod fresnel;
pub mod los;
pub mod p2p;

pub use {
    crate::{
        error::PropahError,
        los::{analyze_profile, curvature_drop_m, LosResult, DEFAULT_K_FACTOR},
        p2p::{analyze, LineOfSight, LineOfSightBuilder},
    },
    elevation, terrain,
};
