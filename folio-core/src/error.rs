use std::{error, fmt};

#[derive(Debug)]
pub enum Error {
    InvalidConfig(String),
    ConfigError(Box<dyn error::Error + Send>),
    InvalidUrl(url::ParseError),
    HostError(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            Self::ConfigError(err) => err.fmt(f),
            Self::InvalidUrl(err) => write!(f, "Invalid URL: {}", err),
            Self::HostError(msg) => write!(f, "Host error: {}", msg),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::ConfigError(Box::new(err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::InvalidUrl(err)
    }
}
