// Serialized request execution against the device.
//
// One gateway per device; one request in flight at a time across all
// callers. The embedded controllers this targets (garage relay boards,
// ESP firmwares) drop or garble overlapping requests.

use reqwest::Method;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::endpoint::EndpointConfig;
use crate::error::Error;

/// Executes HTTP actions against the device, one at a time, and
/// validates the response against an expected JSON field/value contract.
pub struct ActionGateway {
    http: reqwest::Client,
    endpoint: EndpointConfig,
    /// Global HTTP mutual-exclusion domain: held for the whole exchange,
    /// released before the caller resumes with the result.
    in_flight: Mutex<()>,
}

impl ActionGateway {
    /// Create a gateway for an endpoint, building the HTTP client from it.
    pub fn new(endpoint: EndpointConfig) -> Result<Self, Error> {
        let http = endpoint.build_client()?;
        Ok(Self {
            http,
            endpoint,
            in_flight: Mutex::new(()),
        })
    }

    /// Create a gateway with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoint: EndpointConfig) -> Self {
        Self {
            http,
            endpoint,
            in_flight: Mutex::new(()),
        }
    }

    /// The endpoint this gateway talks to.
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Execute one request and validate the response shape.
    ///
    /// Success requires an HTTP 2xx status and a JSON body; when
    /// `expected_field` is given the field must be present, and when
    /// `expected_value` is also given it must match exactly. Errors that
    /// arise after the body was read carry the raw body for logging.
    ///
    /// The in-flight lock is released when this future completes, so a
    /// caller may issue a follow-up request from its continuation
    /// without deadlocking.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        expected_field: Option<&str>,
        expected_value: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.endpoint.url_for(path)?;

        let _guard = self.in_flight.lock().await;
        debug!(%method, %url, "requesting door controller URI");

        let resp = self.http.request(method, url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            debug!(code = status.as_u16(), "request failed");
            return Err(Error::Status {
                code: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        debug!("request completed");

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            debug!(body = %body, "response body was not JSON");
            Error::Parse {
                message: e.to_string(),
                body: body.clone(),
            }
        })?;

        if let Some(field) = expected_field {
            let Some(actual) = json.get(field) else {
                return Err(Error::FieldMissing {
                    field: field.to_owned(),
                    body,
                });
            };

            if let Some(expected) = expected_value {
                if actual != expected {
                    return Err(Error::FieldValueMismatch {
                        field: field.to_owned(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
        }

        Ok(json)
    }
}
