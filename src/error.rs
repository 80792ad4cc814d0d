use crate::literal::CastError;
use thiserror::Error;

// Evaluation errors carry the dotted path of the offending node.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed construct at {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("missing required attribute '{attribute}' at {path}")]
    MissingAttribute { path: String, attribute: String },

    #[error("invalid boolean flag {attribute}={value:?} at {path}")]
    InvalidFlag {
        path: String,
        attribute: String,
        value: String,
    },

    #[error("{source} at {path}")]
    Cast {
        path: String,
        #[source]
        source: CastError,
    },

    #[error("value of {path} was read before it was evaluated")]
    Unresolved { path: String },

    #[error("markup error: {0}")]
    Markup(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(path: String, message: impl Into<String>) -> Self {
        Error::Malformed {
            path,
            message: message.into(),
        }
    }
}
