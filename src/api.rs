// API client module: a small blocking HTTP client that talks to the
// package manager servlet of a CRX instance.

use crate::config::ClientConfig;
use crate::error::{CrxError, Result};
use reqwest::blocking::{multipart, Client, Response};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Operations the upload and install steps need from the package manager.
/// `CrxClient` is the real implementation; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
pub trait PackageService {
    /// POST to `url` with no body and return the response text.
    fn post(&self, url: &str) -> Result<String>;

    /// POST `file` as multipart form data to `url` and return the response text.
    fn upload(&self, url: &str, file: &Path, force: bool) -> Result<String>;
}

/// Reply of `?cmd=upload` on the JSON service endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Blocking client holding a reqwest client and the credentials sent
/// with every request.
#[derive(Clone)]
pub struct CrxClient {
    client: Client,
    config: ClientConfig,
}

impl CrxClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(CrxClient { client, config })
    }

    fn send(&self, url: &str, request: reqwest::blocking::RequestBuilder) -> Result<String> {
        let credentials = &self.config.credentials;
        let res = request
            .basic_auth(&credentials.user, Some(&credentials.password))
            .send()?;
        read_body(url, res)
    }
}

fn read_body(url: &str, res: Response) -> Result<String> {
    let status = res.status();
    debug!(%url, %status, "package manager responded");
    if !status.is_success() {
        let body = res.text().unwrap_or_default();
        return Err(CrxError::Http {
            url: url.to_string(),
            status,
            body,
        });
    }
    Ok(res.text()?)
}

impl PackageService for CrxClient {
    fn post(&self, url: &str) -> Result<String> {
        self.send(url, self.client.post(url))
    }

    fn upload(&self, url: &str, file: &Path, force: bool) -> Result<String> {
        let bytes = fs::read(file).map_err(|source| CrxError::PackageFile {
            path: file.to_path_buf(),
            source,
        })?;
        let file_name = file
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("package.zip")
            .to_string();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/zip")?;
        let form = multipart::Form::new()
            .part("package", part)
            .text("force", force.to_string());

        self.send(url, self.client.post(url).multipart(form))
    }
}
