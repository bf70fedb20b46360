// Endpoint configuration for building reqwest::Client instances.
//
// All gateway requests share one host, port, timeout, and optional
// custom header; paths vary per action. Immutable after construction.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::Error;

/// A single custom header attached to every device request
/// (typically an API key or basic-auth shim).
#[derive(Debug, Clone)]
pub struct CustomHeader {
    pub name: String,
    pub value: String,
}

/// Where and how to reach the device's HTTP server.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Host name or IP of the device.
    pub host: String,
    /// TCP port; 80 is elided from generated URLs.
    pub port: u16,
    /// Per-request timeout applied to the whole exchange.
    pub timeout: Duration,
    /// Optional custom header sent with every request.
    pub header: Option<CustomHeader>,
}

impl EndpointConfig {
    /// The device base URL, omitting the port suffix for the HTTP default.
    pub fn base_url(&self) -> String {
        if self.port == 80 {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }

    /// Build the absolute URL for an action path (e.g. `/door/open`).
    pub fn url_for(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}{path}", self.base_url()))?)
    }

    /// Build a `reqwest::Client` from this config: request timeout plus
    /// the custom header (as a default header) when configured.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("doorlink/", env!("CARGO_PKG_VERSION")));

        if let Some(ref header) = self.header {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|e| Error::ClientBuild(format!("invalid header name: {e}")))?;
            let value = HeaderValue::from_str(&header.value)
                .map_err(|e| Error::ClientBuild(format!("invalid header value: {e}")))?;
            let mut headers = HeaderMap::new();
            headers.insert(name, value);
            builder = builder.default_headers(headers);
        }

        builder
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(port: u16) -> EndpointConfig {
        EndpointConfig {
            host: "garage.local".into(),
            port,
            timeout: Duration::from_secs(10),
            header: None,
        }
    }

    #[test]
    fn default_port_is_elided() {
        assert_eq!(endpoint(80).base_url(), "http://garage.local");
    }

    #[test]
    fn non_default_port_is_kept() {
        assert_eq!(endpoint(8080).base_url(), "http://garage.local:8080");
    }

    #[test]
    fn url_for_joins_path() {
        let url = endpoint(8080).url_for("/door/open").expect("valid url");
        assert_eq!(url.as_str(), "http://garage.local:8080/door/open");
    }

    #[test]
    fn bad_header_name_is_rejected() {
        let mut ep = endpoint(80);
        ep.header = Some(CustomHeader {
            name: "not a header\n".into(),
            value: "x".into(),
        });
        assert!(matches!(ep.build_client(), Err(Error::ClientBuild(_))));
    }
}
