pub mod auth;
pub mod builders;
pub(crate) mod errors;
pub(crate) mod http;
pub mod ingest;
pub mod params;
pub mod vault;

#[cfg(test)]
pub(crate) mod testing;

pub(crate) use errors::{error, this_errors};

pub use errors::{ErrorKind, SnowpipeError};

pub use auth::PrivateKey;
pub use builders::{
    build_ingest_manager_from_parameters, build_ingest_manager_using_vault_private_key,
    build_ingest_manager_via_environment_variables, build_ingest_manager_via_parameters_json,
    build_ingest_manager_via_parameters_object, build_ingest_manager_via_secrets_file,
};
pub use ingest::{
    IngestManagerOpts, IngestManagerOptsBuilder, SimpleIngestManager, StagedFile,
    dispatch::{SUCCESS_RESPONSE_CODE, trigger_ingestion},
};
pub use params::{
    ConnectionParameters, Credential, EnvSource, ProcessEnv, RawConnectionParameters, VaultLookup,
    VaultLookupBuilder, sources::private_key_secret_name,
};
pub use vault::{AzureKeyVault, AzureKeyVaultSettings, AzureKeyVaultSettingsBuilder, SecretVault};

pub use http::client::SnowpipeHttpClient;
pub use http::ingest::IngestResponse;

#[cfg(feature = "reqwest")]
pub type ReqwestIngestManager = SimpleIngestManager<reqwest::Client>;
