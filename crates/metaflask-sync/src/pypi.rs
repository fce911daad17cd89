//! Package metadata from the Python package index.

use async_trait::async_trait;
use metaflask_common_config::PypiConfig;
use metaflask_common_http::HttpClient;
use metaflask_common_log::remote_span;
use reqwest::StatusCode;
use tracing::{debug, Instrument};
use url::Url;

use crate::error::{SyncError, SyncResult};
use crate::github::base_url;

const SERVICE: &str = "pypi";

/// Source of raw package metadata documents.
#[async_trait]
pub trait PackageInfoProvider: Send + Sync {
    /// Raw JSON for `package`, or `None` if the index does not know it.
    async fn fetch(&self, package: &str) -> SyncResult<Option<Vec<u8>>>;
}

/// Client for the package index JSON API (`<base>/<name>/json`).
#[derive(Debug, Clone)]
pub struct PackageIndexClient {
    http: HttpClient,
    base: Url,
}

impl PackageIndexClient {
    pub fn new(http: HttpClient, config: &PypiConfig) -> SyncResult<Self> {
        Ok(Self {
            http,
            base: base_url(&config.base_url)?,
        })
    }

    fn package_url(&self, package: &str) -> SyncResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::Url {
                url: self.base.to_string(),
                message: "cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .push(package)
            .push("json");
        Ok(url)
    }
}

#[async_trait]
impl PackageInfoProvider for PackageIndexClient {
    async fn fetch(&self, package: &str) -> SyncResult<Option<Vec<u8>>> {
        let url = self.package_url(package)?;
        async {
            let response = self
                .http
                .get(url.as_str())
                .await
                .map_err(|e| SyncError::remote(SERVICE, e))?;
            if response.status() == StatusCode::NOT_FOUND {
                debug!(package, "package not on the index");
                return Ok::<_, SyncError>(None);
            }
            let response = HttpClient::check_response(response)
                .await
                .map_err(|e| SyncError::remote(SERVICE, e))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| SyncError::remote(SERVICE, e.into()))?;
            Ok(Some(bytes.to_vec()))
        }
        .instrument(remote_span(SERVICE, "fetch_package"))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_url() {
        let client = PackageIndexClient::new(HttpClient::new().unwrap(), &PypiConfig::default()).unwrap();
        assert_eq!(
            client.package_url("Flask-SQLAlchemy").unwrap().as_str(),
            "https://pypi.python.org/pypi/Flask-SQLAlchemy/json"
        );
        assert_eq!(
            client.package_url("a/b").unwrap().as_str(),
            "https://pypi.python.org/pypi/a%2Fb/json"
        );
    }
}
