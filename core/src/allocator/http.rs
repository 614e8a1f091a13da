//! Blocking HTTP allocator client.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{AllocationRequest, AllocationResponse, Allocator, SegmentRecord};
use crate::data::settings::Settings;
use crate::error::{AllocatorError, ReconcileError};

const HEALTH: &str = "/health";
const SEGMENTS: &str = "/segments?allocated=true";
const ALLOCATE: &str = "/allocate-vlan";

/// Allocator reached over HTTP with bounded connect and read timeouts.
pub struct HttpAllocator {
    base_url: String,
    client: Client,
    health_timeout: Duration,
    credentials: Option<(String, String)>,
}

impl HttpAllocator {
    pub fn new(settings: &Settings) -> Result<Self, ReconcileError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .timeout(Duration::from_millis(settings.read_timeout_ms))
            .build()
            .map_err(|e| ReconcileError::Settings(format!("cannot build HTTP client: {}", e)))?;

        let credentials = match (&settings.username, &settings.password) {
            (Some(u), Some(p)) => Some((u.clone(), p.clone())),
            _ => None,
        };

        Ok(HttpAllocator {
            base_url: settings.api_url.clone(),
            client,
            health_timeout: Duration::from_millis(settings.health_timeout_ms),
            credentials,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    fn send(&self, endpoint: &str, builder: RequestBuilder) -> Result<Response, AllocatorError> {
        debug!(url = %self.url(endpoint), "allocator request");
        let response = self
            .authed(builder)
            .send()
            .map_err(|e| transport_error(endpoint, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AllocatorError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, AllocatorError> {
        response.json::<T>().map_err(|e| AllocatorError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Allocator for HttpAllocator {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn health(&self) -> Result<(), AllocatorError> {
        let builder = self.client.get(self.url(HEALTH)).timeout(self.health_timeout);
        self.send(HEALTH, builder).map(|_| ())
    }

    fn allocated_segments(&self) -> Result<Vec<SegmentRecord>, AllocatorError> {
        let response = self.send(SEGMENTS, self.client.get(self.url(SEGMENTS)))?;
        let body: serde_json::Value = Self::decode(SEGMENTS, response)?;
        match body {
            serde_json::Value::Array(_) => {
                serde_json::from_value(body).map_err(|e| AllocatorError::Decode {
                    endpoint: SEGMENTS.to_string(),
                    reason: e.to_string(),
                })
            }
            // The service returns a bare list; anything else carries no records.
            _ => Ok(Vec::new()),
        }
    }

    fn allocate_vlan(&self, request: &AllocationRequest) -> Result<AllocationResponse, AllocatorError> {
        let builder = self.client.post(self.url(ALLOCATE)).json(request);
        let response = self.send(ALLOCATE, builder)?;
        Self::decode(ALLOCATE, response)
    }
}

/// Join a base URL and an endpoint with exactly one `/` between them.
pub fn join_url(base: &str, endpoint: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), endpoint.trim_start_matches('/'))
}

fn transport_error(endpoint: &str, e: &reqwest::Error) -> AllocatorError {
    if e.is_timeout() {
        AllocatorError::Timeout(endpoint.to_string())
    } else if e.is_connect() {
        AllocatorError::Connect(endpoint.to_string())
    } else {
        AllocatorError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    }
}
