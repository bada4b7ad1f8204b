use log::{debug, info};
use native_tls::TlsConnector;
use reqwest::blocking::{Client, RequestBuilder};

use crate::{error::Result, request::RequestSpec, response::ResponseView};

const USER_AGENT: &str = concat!("reqline/", env!("CARGO_PKG_VERSION"));

/// Build the blocking client used for a single request.
///
/// # Arguments
///
/// * `spec` - The request; only its timeout is used here.
/// * `verbose` - Log connection-level traffic.
///
/// # Returns
///
/// * `Result<Client>` - A client requiring TLS 1.2 or newer.
pub fn build_client(spec: &RequestSpec, verbose: bool) -> Result<Client> {
    let mut tls = TlsConnector::builder();
    tls.danger_accept_invalid_certs(false)
        .danger_accept_invalid_hostnames(false)
        .min_protocol_version(Some(native_tls::Protocol::Tlsv12));
    let connector = tls.build()?;

    // No timeout unless one was asked for; the blocking client defaults to 30s.
    let client = Client::builder()
        .use_preconfigured_tls(connector)
        .user_agent(USER_AGENT)
        .connection_verbose(verbose)
        .timeout(spec.timeout)
        .build()?;

    Ok(client)
}

/// Turn a `RequestSpec` into a ready-to-send request on `client`.
pub fn build_request(client: &Client, spec: &RequestSpec) -> RequestBuilder {
    let mut request = client.request(spec.method.into(), spec.url.as_str());

    for (key, value) in &spec.headers {
        request = request.header(key.as_str(), value.as_str());
    }

    if !spec.queries.is_empty() {
        request = request.query(&spec.queries);
    }

    if let Some(body) = &spec.body {
        debug!(
            "Attaching {} body ({})",
            body.content_type(),
            spec.headers
                .get("content-type")
                .map(String::as_str)
                .unwrap_or("no content-type")
        );
        request = request.body(body.clone().into_bytes());
    }

    request
}

/// Send the request and wrap whatever comes back.
///
/// Connection failures, TLS failures and an exceeded timeout all surface as
/// errors; no retries are attempted.
pub fn send_request(spec: &RequestSpec, verbose: bool) -> Result<ResponseView> {
    let client = build_client(spec, verbose)?;

    debug!("Sending {} {}", spec.method, spec.url);
    let response = build_request(&client, spec).send()?;
    info!("{} {} -> {}", spec.method, response.url(), response.status());

    Ok(ResponseView::from(response))
}
