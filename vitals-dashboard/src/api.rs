//! REST access to the clinical backend.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use vitals_core::{ClinicalRecord, VitalsError};

/// Read-only collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Medications,
    Vitals,
    MedicationLogs,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::Medications => "/medications",
            Resource::Vitals => "/vitals",
            Resource::MedicationLogs => "/logs/medications",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned an unusable body: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }
}

impl From<FetchError> for VitalsError {
    fn from(err: FetchError) -> Self {
        VitalsError::Fetch {
            resource: err.url().to_string(),
            message: err.to_string(),
        }
    }
}

/// Where the controller gets its records from.
#[async_trait]
pub trait RecordSource {
    async fn fetch(&self, resource: Resource) -> Result<Vec<ClinicalRecord>, FetchError>;
}

/// `RecordSource` over HTTP. Requests carry no timeout.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    api_base: String,
}

impl HttpSource {
    pub fn new(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, resource: Resource) -> String {
        format!("{}{}", self.api_base, resource.path())
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self, resource: Resource) -> Result<Vec<ClinicalRecord>, FetchError> {
        let url = self.url_for(resource);
        tracing::debug!(%url, "fetching records");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|err| FetchError::Decode {
            url: url.clone(),
            message: err.to_string(),
        })?;

        vitals_fhir::normalize_payload(&body).map_err(|err| FetchError::Decode {
            url,
            message: err.to_string(),
        })
    }
}
