//! Client side of the `query` command.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use statswatch_collector::{ReadRequest, ReadResponse, ServiceFilter};

use crate::duration::parse_duration;

/// Build a read request from command-line style arguments.
///
/// A version without a service name is ignored, matching how filters are
/// applied on the server.
pub fn build_request(service: Option<&str>, version: Option<&str>, past: bool) -> ReadRequest {
    let mut request = if past {
        ReadRequest::past()
    } else {
        ReadRequest::current()
    };

    if let Some(name) = service.filter(|s| !s.is_empty()) {
        let mut filter = ServiceFilter::name(name);
        if let Some(version) = version.filter(|v| !v.is_empty()) {
            filter = filter.version(version);
        }
        request = request.with_service(filter);
    }
    request
}

/// Parse the `--timeout` argument; a malformed value is an error, not a default.
pub fn request_timeout(value: &str) -> Result<Duration> {
    let timeout = parse_duration(value).with_context(|| format!("invalid --timeout: {value}"))?;
    if timeout.is_zero() {
        bail!("invalid --timeout: {value} (must be non-zero)");
    }
    Ok(timeout)
}

/// Normalise `host:port` or a full URL into the read endpoint.
pub fn read_url(addr: &str) -> String {
    let base = addr.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}/stats/read")
    } else {
        format!("http://{base}/stats/read")
    }
}

/// Send a read request to a running server.
pub async fn query(addr: &str, request: &ReadRequest, timeout: Duration) -> Result<ReadResponse> {
    let url = read_url(addr);
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let response = client
        .post(&url)
        .json(request)
        .send()
        .await
        .with_context(|| format!("failed to reach {url}"))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        bail!("server returned {status}: {}", detail.trim());
    }

    response
        .json()
        .await
        .context("failed to decode read response")
}
