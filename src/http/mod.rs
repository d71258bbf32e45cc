use std::collections::HashMap;

use crate::{SnowpipeError, error, errors::ErrorKind, http::client::SnowpipeHttpClient, this_errors};
use derive_builder::Builder;
use serde::{Deserialize, de::DeserializeOwned};

pub mod client;
pub mod ingest;
pub(crate) mod url;

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
pub(crate) struct GenericResponse<T> {
    pub(crate) data: T,
    pub(crate) code: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    error_code: Option<String>,
    next_action: Option<String>,
}

// Snowflake sends `"data": null` on most REST failures.
pub(crate) type ErrorResponse = GenericResponse<Option<ErrorData>>;

impl ErrorResponse {
    pub(crate) fn describe(&self) -> String {
        let data = self.data.as_ref();
        let code = self
            .code
            .as_deref()
            .or_else(|| data.and_then(|d| d.error_code.as_deref()));

        let mut described = match (code, self.message.as_deref()) {
            (Some(code), Some(message)) => format!("{message} (code {code})"),
            (None, Some(message)) => message.to_string(),
            (Some(code), None) => format!("request failed with code {code}"),
            (None, None) => "request failed without an error message".to_string(),
        };

        if let Some(next_action) = data.and_then(|d| d.next_action.as_deref()) {
            described.push_str(&format!(", next action: {next_action}"));
        }

        described
    }
}

/// A single outbound request. Errors raised while sending or decoding are
/// reported under `kind`.
#[derive(Builder)]
pub(crate) struct Request<C: SnowpipeHttpClient> {
    client: C,

    #[builder(setter(into))]
    base_url: String,

    #[builder(default = None, setter(into, strip_option))]
    path: Option<String>,

    #[builder(setter(into, strip_option), default = None)]
    params: Option<Vec<(String, String)>>,

    #[builder(setter(into), default = HashMap::new())]
    headers: HashMap<String, String>,

    #[builder(setter(into, strip_option), default = None)]
    bearer_token: Option<String>,

    #[builder(default = ErrorKind::Ingestion)]
    kind: ErrorKind,
}

impl<C: SnowpipeHttpClient> Request<C> {
    fn build_url(&self) -> Result<String, SnowpipeError> {
        let pathname = match self.path.as_deref() {
            Some(path) => format!("{}{}", self.base_url.trim_end_matches('/'), path),
            None => self.base_url.clone(),
        };

        let params = self.params.as_deref().unwrap_or_default();

        let url = this_errors!(
            Ingestion,
            "failed to construct url",
            url::construct_url(pathname.as_str(), params)
        );

        Ok(url)
    }

    fn take_headers(&mut self, content_type: &str) -> HashMap<String, String> {
        let mut headers = std::mem::take(&mut self.headers);

        if let Some(token) = self.bearer_token.as_deref() {
            headers.insert("Authorization".into(), format!("Bearer {}", token));
        }

        headers
            .entry("accept".into())
            .or_insert_with(|| "application/json".into());
        headers.insert("content-type".into(), content_type.into());
        headers
    }

    pub async fn post_json<T: DeserializeOwned>(
        self,
        body: serde_json::Value,
    ) -> Result<T, SnowpipeError> {
        let kind = self.kind;
        self.send_post_json(body).await.map_err(|e| e.with_kind(kind))
    }

    pub async fn post_form<T: DeserializeOwned>(
        self,
        form: &[(String, String)],
    ) -> Result<T, SnowpipeError> {
        let kind = self.kind;
        self.send_post_form(form).await.map_err(|e| e.with_kind(kind))
    }

    pub async fn get<T: DeserializeOwned>(self) -> Result<T, SnowpipeError> {
        let kind = self.kind;
        self.send_get().await.map_err(|e| e.with_kind(kind))
    }

    async fn send_post_json<T: DeserializeOwned>(
        mut self,
        body: serde_json::Value,
    ) -> Result<T, SnowpipeError> {
        let url = self.build_url()?;
        let headers = self.take_headers("application/json");

        let body_bytes = this_errors!(
            Ingestion,
            "failed to serialise body as json",
            serde_json::to_vec(&body)
        );

        let resp = self.client.post(url.as_str(), body_bytes, headers).await?;

        decode(&resp)
    }

    async fn send_post_form<T: DeserializeOwned>(
        mut self,
        form: &[(String, String)],
    ) -> Result<T, SnowpipeError> {
        let url = self.build_url()?;
        let headers = self.take_headers("application/x-www-form-urlencoded");

        let body = this_errors!(Ingestion, "failed to encode form body", url::encode_form(form));

        let resp = self
            .client
            .post(url.as_str(), body.into_bytes(), headers)
            .await?;

        decode(&resp)
    }

    async fn send_get<T: DeserializeOwned>(mut self) -> Result<T, SnowpipeError> {
        let url = self.build_url()?;
        let mut headers = self.take_headers("application/json");
        headers.remove("content-type");

        let resp = self.client.get(url.as_str(), headers).await?;

        decode(&resp)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, SnowpipeError> {
    serde_json::from_slice::<T>(body).map_err(|e| {
        let preview = String::from_utf8_lossy(&body[..body.len().min(256)]).into_owned();
        error!(
            Ingestion,
            message = format!("failed to parse response as json - {e}: {preview}")
        )
    })
}
