use axum::response::IntoResponse;
use reqwest::StatusCode;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("unresolved author id: {0}")]
    UnresolvedAuthor(String),

    #[error("{0}")]
    Upstream(&'static str),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Reqwest(e) => {
                tracing::error!(%e, "document service request failed");
                (StatusCode::BAD_GATEWAY, "Bad Gateway")
            }
            .into_response(),
            Error::UnresolvedAuthor(id) => {
                tracing::error!(%id, "post references unknown author");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
            Error::Upstream(e) => {
                tracing::error!(%e, "malformed document service payload");
                (StatusCode::BAD_GATEWAY, "Bad Gateway")
            }
            .into_response(),
        }
    }
}
