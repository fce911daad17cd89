//! Decoding of JSON bodies.

use serde::de::DeserializeOwned;

/// A body that could not be read or did not match the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("could not read the response body: {0}")]
    Read(#[source] reqwest::Error),

    #[error("unexpected JSON in a {status} response: {source}")]
    Parse {
        status: u16,
        /// The raw body, lossily decoded.
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read the whole body and deserialize it.
pub async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ResponseError> {
    let status = response.status().as_u16();
    let raw = response.bytes().await.map_err(ResponseError::Read)?;
    serde_json::from_slice(&raw).map_err(|source| ResponseError::Parse {
        status,
        body: String::from_utf8_lossy(&raw).into_owned(),
        source,
    })
}
