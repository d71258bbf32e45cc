use std::collections::HashMap;

use crate::SnowpipeError;
use core::future::Future;

/// Transport used for every request this crate makes, to Snowpipe and to a vault.
///
/// Implementations return the raw response body. Status codes are not
/// interpreted here; callers decode the body into a success or failure shape.
pub trait SnowpipeHttpClient: Clone + Send + Sync + 'static {
    fn new() -> Self;

    fn get(
        &self,
        url: &str,
        headers: HashMap<String, String>,
    ) -> impl Future<Output = Result<Vec<u8>, SnowpipeError>> + Send;

    fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: HashMap<String, String>,
    ) -> impl Future<Output = Result<Vec<u8>, SnowpipeError>> + Send;
}

#[cfg(feature = "reqwest")]
fn to_header_map(
    headers: &HashMap<String, String>,
) -> Result<reqwest::header::HeaderMap, SnowpipeError> {
    use crate::error;

    let pairs = headers
        .iter()
        .map(|(k, v)| {
            Ok((
                reqwest::header::HeaderName::from_bytes(k.as_bytes())
                    .map_err(|e| error!(Ingestion, "invalid header name", e))?,
                reqwest::header::HeaderValue::from_str(v.as_str())
                    .map_err(|e| error!(Ingestion, "invalid header value", e))?,
            ))
        })
        .collect::<Result<
            Vec<(reqwest::header::HeaderName, reqwest::header::HeaderValue)>,
            SnowpipeError,
        >>()?;

    Ok(reqwest::header::HeaderMap::from_iter(pairs))
}

#[cfg(feature = "reqwest")]
impl SnowpipeHttpClient for reqwest::Client {
    fn new() -> Self {
        reqwest::Client::builder()
            .gzip(true)
            .referer(false)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }

    fn get(
        &self,
        url: &str,
        headers: HashMap<String, String>,
    ) -> impl Future<Output = Result<Vec<u8>, SnowpipeError>> {
        use crate::this_errors;

        async move {
            let url = this_errors!(Ingestion, "failed to parse url", reqwest::Url::parse(url));
            let headers = to_header_map(&headers)?;

            tracing::debug!(host = url.host_str(), path = url.path(), "sending get request");

            let resp = this_errors!(
                Ingestion,
                "failed to send get request",
                self.get(url).headers(headers).send().await
            );

            tracing::debug!(status = resp.status().as_u16(), "received response");

            let bytes = this_errors!(Ingestion, "failed to get response bytes", resp.bytes().await);

            Ok(bytes.to_vec())
        }
    }

    fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: HashMap<String, String>,
    ) -> impl Future<Output = Result<Vec<u8>, SnowpipeError>> {
        use crate::this_errors;

        async move {
            let url = this_errors!(Ingestion, "failed to parse url", reqwest::Url::parse(url));
            let headers = to_header_map(&headers)?;

            tracing::debug!(
                host = url.host_str(),
                path = url.path(),
                body_len = body.len(),
                "sending post request"
            );

            let resp = this_errors!(
                Ingestion,
                "failed to send post request",
                self.post(url).body(body).headers(headers).send().await
            );

            tracing::debug!(status = resp.status().as_u16(), "received response");

            let bytes = this_errors!(Ingestion, "failed to get response bytes", resp.bytes().await);

            Ok(bytes.to_vec())
        }
    }
}
