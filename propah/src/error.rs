use terrain::TerrainError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropahError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("k-factor must be positive and finite, got {0}")]
    KFactor(f64),

    #[error("frequency must be positive and finite, got {0} Hz")]
    Frequency(f64),

    #[error("{0}")]
    Terrain(#[from] TerrainError),
}
