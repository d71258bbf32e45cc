use std::collections::HashMap;

use derive_builder::Builder;
use serde::Serialize;

use crate::{
    SnowpipeError,
    auth::PrivateKey,
    error,
    http::{
        self,
        client::SnowpipeHttpClient,
        ingest::{IngestResponse, InsertFilesRequest, InsertFilesResponse},
    },
    params::{ConnectionParameters, Credential},
    this_errors,
};

pub mod dispatch;

static INSERT_FILES_PATH: &str = "insertFiles";
static TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";
static TOKEN_TYPE_KEYPAIR: &str = "KEYPAIR_JWT";

/// A file already sitting in the pipe's stage.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StagedFile {
    /// Path relative to the stage location the pipe reads from.
    pub path: String,

    /// Size in bytes, if known. Only used as a hint by Snowpipe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl StagedFile {
    pub fn new(path: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

#[derive(Builder, Debug, Clone)]
pub struct IngestManagerOpts {
    #[builder(setter(into))]
    pub(crate) account: String,

    #[builder(setter(into))]
    pub(crate) user: String,

    pub(crate) private_key: PrivateKey,

    /// Fully qualified pipe name, e.g. `DB.SCHEMA.PIPE`.
    #[builder(setter(into, strip_option), default = None)]
    pub(crate) pipe: Option<String>,

    /// Override the Snowpipe endpoint host.
    ///
    /// If unset, this will default to `{account}.snowflakecomputing.com`
    #[builder(setter(into, strip_option), default = None)]
    pub(crate) host: Option<String>,
}

/// Handle for submitting staged files to one Snowpipe pipe.
#[derive(Debug, Clone)]
pub struct SimpleIngestManager<C: SnowpipeHttpClient> {
    account: String,
    host: String,
    user: String,
    pipe: Option<String>,
    private_key: PrivateKey,
    client: C,
}

impl<C: SnowpipeHttpClient> SimpleIngestManager<C> {
    pub fn new(opts: IngestManagerOpts) -> Self {
        Self::with_client(opts, C::new())
    }

    pub fn with_client(opts: IngestManagerOpts, client: C) -> Self {
        let host = opts
            .host
            .unwrap_or_else(|| format!("{}.snowflakecomputing.com", opts.account));

        Self {
            account: opts.account,
            host,
            user: opts.user,
            pipe: opts.pipe,
            private_key: opts.private_key,
            client,
        }
    }

    /// Loads the private key named by `params` and builds a manager for
    /// `pipe`. Password credentials are rejected: Snowpipe only accepts
    /// key-pair authentication.
    pub fn from_parameters(
        params: &ConnectionParameters,
        pipe: Option<&str>,
        client: C,
    ) -> Result<Self, SnowpipeError> {
        let passphrase = params.private_key_passphrase();

        let private_key = match params.credential() {
            Credential::PrivateKeyPath(path) => PrivateKey::from_file(path, passphrase)?,
            Credential::PrivateKeyPlainText(pem) => PrivateKey::from_pem(pem, passphrase)?,
            Credential::Password(_) => {
                return Err(error!(
                    Configuration,
                    "snowpipe requires key-pair authentication; provide private_key_path or private_key_plain_text instead of password"
                ));
            }
        };

        let mut opts = IngestManagerOptsBuilder::default();
        opts.account(params.account())
            .user(params.user())
            .private_key(private_key)
            .host(params.host());

        if let Some(pipe) = pipe {
            opts.pipe(pipe);
        }

        let opts = this_errors!(
            Configuration,
            "failed to build ingest manager options",
            opts.build()
        );

        tracing::debug!(
            account = params.account(),
            user = params.user(),
            pipe = pipe,
            "built snowpipe ingest manager"
        );

        Ok(Self::with_client(opts, client))
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn pipe(&self) -> Option<&str> {
        self.pipe.as_deref()
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Submits `files` to the pipe in a single `insertFiles` request.
    ///
    /// Returns Snowpipe's response as-is; callers decide what counts as
    /// accepted. Requests Snowflake rejects outright (bad token, unknown pipe)
    /// come back as errors carrying the server's message.
    pub async fn ingest_files(&self, files: &[StagedFile]) -> Result<IngestResponse, SnowpipeError> {
        let pipe = self.pipe.as_deref().ok_or_else(|| {
            error!(
                Configuration,
                "ingest manager has no target pipe; pass a pipe name when building it"
            )
        })?;

        let token = self.private_key.create_ingest_jwt(&self.account, &self.user)?;

        let pipe_segment = this_errors!(
            Ingestion,
            "failed to encode pipe name",
            http::url::encode_segment(pipe)
        );

        let mut headers = HashMap::new();
        headers.insert(TOKEN_TYPE_HEADER.to_string(), TOKEN_TYPE_KEYPAIR.to_string());
        headers.insert(
            "User-Agent".to_string(),
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        );

        let request_id = uuid::Uuid::new_v4().to_string();

        let request = this_errors!(
            Ingestion,
            "failed to build insert files request",
            http::RequestBuilder::default()
                .client(self.client.clone())
                .base_url(format!("https://{}", self.host))
                .path(format!("/v1/data/pipes/{}/{}", pipe_segment, INSERT_FILES_PATH))
                .params(vec![("requestId".to_string(), request_id.clone())])
                .headers(headers)
                .bearer_token(token)
                .build()
        );

        let body = this_errors!(
            Ingestion,
            "failed to serialise staged files",
            serde_json::to_value(InsertFilesRequest { files })
        );

        tracing::debug!(
            pipe = pipe,
            request_id = request_id.as_str(),
            files = files.len(),
            "submitting insert files request"
        );

        match request.post_json::<InsertFilesResponse>(body).await? {
            InsertFilesResponse::Accepted(resp) => Ok(resp),
            InsertFilesResponse::Failure(err) => {
                Err(error!(Ingestion, message = err.describe()))
            }
        }
    }
}
