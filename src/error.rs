use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("malformed input at {path}: {reason}")]
    MalformedInput { path: String, reason: String },

    #[error("identity key {id:?} is used by more than one node")]
    DuplicateIdentity { id: String },

    #[error("no visible node has the identity key {id:?}")]
    UnknownNode { id: String },

    #[error("expected a single top-level record but got {count}")]
    ExtraRoots { count: usize },

    #[error("a load is already in progress")]
    Busy,

    #[error("no load has been started")]
    NotLoading,

    #[error("no tree has been loaded")]
    NotLoaded,
}

impl Error {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: if path.is_empty() {
                "<root>".to_owned()
            } else {
                path.to_owned()
            },
            reason: reason.into(),
        }
    }
}

/// Failure of a [`DataSource`](crate::DataSource).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("data source failed: {0}")]
    Source(String),
}

#[test]
fn malformed_names_the_root_when_path_is_empty() {
    let error = Error::malformed("", "not a record");
    assert_eq!(
        error.to_string(),
        "malformed input at <root>: not a record"
    );
}
