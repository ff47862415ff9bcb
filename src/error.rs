use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("OME-NGFF version {0:?} is not yet supported")]
    UnsupportedVersion(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("malformed metadata: {0}")]
    Malformed(String),
    #[error("{} is not a descendant of {}", descendant.display(), ancestor.display())]
    NotADescendant {
        ancestor: PathBuf,
        descendant: PathBuf,
    },
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Wrapped(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn wrap(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Wrapped(Box::new(error))
    }
}
