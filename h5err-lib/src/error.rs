use crate::library::LibraryError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// Failure detected on our side of the native boundary.
    #[error("binding error: {0}")]
    Binding(String),

    #[error("unknown major error symbol {0}")]
    UnknownMajor(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Config invalid: {0}")]
    ConfigInvalid(String),
    #[error("Failed to load config: {}", .source)]
    ConfigLoad {
        #[from]
        source: serde_yaml::Error,
    },
}

impl Error {
    /// The library error, if this is one.
    pub fn library(&self) -> Option<&LibraryError> {
        match self {
            Error::Library(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
