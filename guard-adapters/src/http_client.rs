use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Bytes, to_bytes};
use hyper::client::HttpConnector;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use hyper::{Body, Client, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use tokio::time::timeout;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{AdapterError, AdapterResult};

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Raw HTTP exchange returned by [`post_json`].
pub(crate) struct JsonResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn build_https_client() -> AdapterResult<HyperClient> {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    // Plain http stays allowed so local proxies and mock servers work.
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    Ok(Client::builder().build::<_, Body>(connector))
}

/// Posts a JSON body with bearer authentication and buffers the reply.
///
/// Only transport failures are errors here; the caller decides what a
/// non-success status means.
pub(crate) async fn post_json(
    client: &HyperClient,
    endpoint: &Uri,
    api_key: &str,
    body: Vec<u8>,
    deadline: Duration,
) -> AdapterResult<JsonResponse> {
    let request = Request::post(endpoint.clone())
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {api_key}"))
        .body(Body::from(body))
        .map_err(|err| AdapterError::transport(format!("failed to build request: {err}")))?;

    let response = timeout(deadline, client.request(request))
        .await
        .map_err(|_| AdapterError::transport(format!("request to {endpoint} timed out")))?
        .map_err(|err| AdapterError::transport(format!("request to {endpoint} failed: {err}")))?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body())
        .await
        .map_err(|err| AdapterError::transport(format!("failed to read response: {err}")))?;

    Ok(JsonResponse {
        status,
        headers,
        body,
    })
}
