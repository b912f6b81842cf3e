use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerrainError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("no elevation for profile sample {index}")]
    MissingElevation { index: usize },
}
