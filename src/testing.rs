use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, OnceLock},
};

use pkcs8::{EncodePrivateKey, LineEnding};
use rsa::{RsaPrivateKey, rand_core::OsRng};

use crate::{SnowpipeError, error, http::client::SnowpipeHttpClient};

/// A PKCS#8 PEM key generated once per test binary.
pub(crate) fn private_key_pem() -> &'static str {
    static PEM: OnceLock<String> = OnceLock::new();

    PEM.get_or_init(|| {
        let key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
    })
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl RecordedCall {
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(self.body.as_deref().unwrap_or_default()).unwrap()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8(self.body.clone().unwrap_or_default()).unwrap()
    }
}

/// Replays queued bodies in order and records every call. An empty queue
/// answers with a transport error.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockClient {
    responses: Arc<Mutex<VecDeque<Result<Vec<u8>, String>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockClient {
    pub fn respond_with(self, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(body.as_bytes().to_vec()));
        self
    }

    pub fn fail_with(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, call: RecordedCall) -> Result<Vec<u8>, SnowpipeError> {
        self.calls.lock().unwrap().push(call);

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(error!(Ingestion, message = message)),
            None => Err(error!(Ingestion, "no response queued")),
        }
    }
}

impl SnowpipeHttpClient for MockClient {
    fn new() -> Self {
        MockClient::default()
    }

    async fn get(
        &self,
        url: &str,
        headers: HashMap<String, String>,
    ) -> Result<Vec<u8>, SnowpipeError> {
        self.answer(RecordedCall {
            method: "GET",
            url: url.to_string(),
            headers,
            body: None,
        })
    }

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: HashMap<String, String>,
    ) -> Result<Vec<u8>, SnowpipeError> {
        self.answer(RecordedCall {
            method: "POST",
            url: url.to_string(),
            headers,
            body: Some(body),
        })
    }
}
