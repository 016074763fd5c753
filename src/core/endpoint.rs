//! Channel endpoint construction.
//!
//! The channel copies the hosting page's security: a page served over `https` talks to a `wss`
//! channel, anything else uses `ws`. The host defaults to the page host unless overridden,
//! either at runtime or at build time through `SOURCE_STATUS_WS_HOST`.

use url::Url;

use super::types::{ChannelError, ChannelResult};

/// Path of the live-source status channel on the admin host.
pub const STATUS_CHANNEL_PATH: &str = "/ws/sources";

const BUILD_HOST_OVERRIDE: Option<&str> = option_env!("SOURCE_STATUS_WS_HOST");

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Hosting page was loaded over an encrypted scheme.
    pub secure: bool,
    /// Host (with optional port) the page was loaded from.
    pub page_host: String,
    pub host_override: Option<String>,
    pub path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            secure: false,
            page_host: "localhost".to_string(),
            host_override: BUILD_HOST_OVERRIDE.map(str::to_string),
            path: STATUS_CHANNEL_PATH.to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn new(secure: bool, page_host: impl Into<String>) -> Self {
        Self {
            secure,
            page_host: page_host.into(),
            ..Self::default()
        }
    }

    /// Derive scheme and host from the URL the admin page was served from.
    pub fn from_page_url(page_url: &str) -> ChannelResult<Self> {
        let parsed = Url::parse(page_url)
            .map_err(|err| ChannelError::InvalidEndpoint(format!("{page_url}: {err}")))?;
        let secure = match parsed.scheme() {
            "https" | "wss" => true,
            "http" | "ws" => false,
            other => {
                return Err(ChannelError::InvalidEndpoint(format!(
                    "unsupported page scheme: {other}"
                )));
            }
        };
        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ChannelError::InvalidEndpoint(format!("missing host: {page_url}")))?;
        // `port()` is only set when it differs from the scheme default.
        let page_host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self::new(secure, page_host))
    }

    pub fn with_host_override(mut self, host: impl Into<String>) -> Self {
        self.host_override = Some(host.into());
        self
    }

    pub fn without_host_override(mut self) -> Self {
        self.host_override = None;
        self
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure { "wss" } else { "ws" }
    }

    pub fn host(&self) -> &str {
        self.host_override
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .unwrap_or(&self.page_host)
    }

    /// `{scheme}://{host}{path}`; fails when no usable host is configured.
    pub fn url(&self) -> ChannelResult<String> {
        let host = self.host().trim();
        if host.is_empty() || host.contains(char::is_whitespace) || host.contains('/') {
            return Err(ChannelError::InvalidEndpoint(format!(
                "unusable host: {host:?}"
            )));
        }
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        Ok(format!("{}://{host}{path}", self.scheme()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_page_selects_wss() {
        let endpoint = EndpointConfig::new(true, "admin.example.com").without_host_override();
        assert_eq!(
            endpoint.url().unwrap(),
            "wss://admin.example.com/ws/sources"
        );

        let plain = EndpointConfig::new(false, "127.0.0.1:8000").without_host_override();
        assert_eq!(plain.url().unwrap(), "ws://127.0.0.1:8000/ws/sources");
    }

    #[test]
    fn host_override_wins_over_page_host() {
        let endpoint =
            EndpointConfig::new(true, "admin.example.com").with_host_override("api.example.com");
        assert_eq!(endpoint.url().unwrap(), "wss://api.example.com/ws/sources");

        let blank = EndpointConfig::new(false, "page.local").with_host_override("  ");
        assert_eq!(blank.url().unwrap(), "ws://page.local/ws/sources");
    }

    #[test]
    fn page_url_parsing() {
        let endpoint = EndpointConfig::from_page_url("https://admin.example.com:8443/sources?x=1")
            .unwrap()
            .without_host_override();
        assert!(endpoint.secure);
        assert_eq!(endpoint.page_host, "admin.example.com:8443");

        let plain = EndpointConfig::from_page_url("http://localhost:5173").unwrap();
        assert!(!plain.secure);
        assert_eq!(plain.page_host, "localhost:5173");

        let default_port = EndpointConfig::from_page_url("https://user:pw@admin.example.com:443/")
            .unwrap();
        assert_eq!(default_port.page_host, "admin.example.com");

        let ipv6 = EndpointConfig::from_page_url("http://[::1]:8000/admin").unwrap();
        assert_eq!(ipv6.page_host, "[::1]:8000");

        assert!(EndpointConfig::from_page_url("localhost").is_err());
        assert!(EndpointConfig::from_page_url("ftp://host/").is_err());
        assert!(EndpointConfig::from_page_url("http://").is_err());
        assert!(matches!(
            EndpointConfig::from_page_url("https://:8443/"),
            Err(ChannelError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn empty_host_is_a_construction_failure() {
        let endpoint = EndpointConfig::new(false, "").without_host_override();
        assert!(matches!(
            endpoint.url(),
            Err(ChannelError::InvalidEndpoint(_))
        ));
    }
}
