use crate::units::Units;
use anyhow::{anyhow, bail, Error as AnyError};
use clap::{Parser, Subcommand, ValueEnum};
use elevation::AggregationMethod;
use geodesy::GeoPoint;
use std::{path::PathBuf, str::FromStr};

/// Aim at surveyed targets and check line of sight over terrain.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// JSON settings file naming elevation providers, aggregation,
    /// retry policy and k-factor.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// How to combine provider elevations.
    #[arg(long, value_enum)]
    pub method: Option<Method>,

    /// Retries per provider after the first attempt.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Per-attempt provider timeout, in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Unit system for human readable output.
    #[arg(short, long, value_enum, default_value_t = Units::Metric)]
    pub units: Units,

    /// Print JSON instead of a summary.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Bearing, distance and pitch from observer to target.
    Solve {
        /// Observer "lat,lon[,alt]", where 'alt' is meters above sea
        /// level. Looked up when omitted.
        #[arg(long, allow_hyphen_values = true)]
        observer: LatLonAlt,

        /// Target "lat,lon[,alt]", where 'alt' is meters above sea
        /// level. Looked up when omitted.
        #[arg(long, allow_hyphen_values = true)]
        target: LatLonAlt,

        /// Instrument height above the observer's ground, in meters.
        #[arg(long, default_value_t = 0.0)]
        instrument_height: f64,

        /// Current true heading of the device, in degrees.
        #[arg(long)]
        heading: Option<f64>,

        /// Current pitch of the device, in degrees (positive up).
        #[arg(long, allow_hyphen_values = true)]
        pitch: Option<f64>,

        /// Also report pitch corrected for curvature and refraction.
        #[arg(short, long)]
        k_factor: Option<f64>,
    },

    /// Line of sight over terrain between two points.
    Los {
        /// Start "lat,lon,alt", where 'alt' is antenna height in meters
        /// above ground.
        #[arg(long, allow_hyphen_values = true)]
        start: LatLonAlt,

        /// Destination "lat,lon,alt", where 'alt' is antenna height in
        /// meters above ground.
        #[arg(long, allow_hyphen_values = true)]
        dest: LatLonAlt,

        /// Profile samples, both endpoints included.
        #[arg(short, long)]
        samples: Option<usize>,

        /// Effective earth radius multiplier.
        #[arg(short, long)]
        k_factor: Option<f64>,

        /// Link frequency in Hz, adds first Fresnel zone clearance.
        #[arg(short, long)]
        freq: Option<f64>,

        #[command(subcommand)]
        output: Output,
    },

    /// Reconciled ground elevation at a point.
    Elevation {
        /// Location "lat,lon".
        #[arg(long, allow_hyphen_values = true)]
        at: LatLonAlt,
    },
}

#[derive(Debug, Subcommand, Clone, Copy)]
pub enum Output {
    /// Print the full result as JSON.
    Json,

    /// Print per-sample terrain and ray heights as CSV.
    Csv,

    /// Plot terrain and ray to terminal.
    Plot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    Mean,
    Median,
}

impl From<Method> for AggregationMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Mean => AggregationMethod::Mean,
            Method::Median => AggregationMethod::Median,
        }
    }
}

/// A location with an optional altitude.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct LatLonAlt {
    pub point: GeoPoint,
    pub alt: Option<f64>,
}

impl FromStr for LatLonAlt {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let parts = s
            .split(',')
            .map(|part| f64::from_str(part.trim()))
            .collect::<Result<Vec<f64>, _>>()?;
        let (lat, lon, alt) = match parts[..] {
            [lat, lon] => (lat, lon, None),
            [lat, lon, alt] => (lat, lon, Some(alt)),
            _ => bail!("not a valid lat,lon[,alt]"),
        };
        if !(-90.0..=90.0).contains(&lat) {
            bail!("latitude {lat} out of range");
        }
        if !(-180.0..=180.0).contains(&lon) {
            bail!("longitude {lon} out of range");
        }
        let point = GeoPoint::new(lat, lon).ok_or_else(|| anyhow!("not a valid lat,lon"))?;
        Ok(Self {
            point,
            alt: alt.filter(|a| a.is_finite()),
        })
    }
}

impl LatLonAlt {
    /// Height above ground, which a ray needs to clear terrain at all.
    pub fn height_above_ground(&self, name: &str) -> Result<f64, AnyError> {
        match self.alt {
            Some(h) if h >= 0.0 => Ok(h),
            Some(h) => bail!("{name} height {h} m is below ground"),
            None => bail!("{name} needs a height above ground, e.g. \"lat,lon,10\""),
        }
    }
}
