use std::path::Path;

use crate::{
    SnowpipeError,
    http::client::SnowpipeHttpClient,
    ingest::SimpleIngestManager,
    params::{
        ConnectionParameters, DEFAULT_PARAMETERS_JSON_PATH, DEFAULT_SECRETS_FILE_PATH, EnvSource,
        RawConnectionParameters, VaultLookup,
    },
    vault::SecretVault,
};

/// Builds an ingest manager from already resolved parameters.
pub fn build_ingest_manager_from_parameters<C: SnowpipeHttpClient>(
    params: &ConnectionParameters,
    target_pipe_name: Option<&str>,
) -> Result<SimpleIngestManager<C>, SnowpipeError> {
    SimpleIngestManager::from_parameters(params, target_pipe_name, C::new())
}

/// Reads parameters from a local JSON file, `snowflake_connection_parameters.json`
/// in the working directory unless `path` is given.
pub fn build_ingest_manager_via_parameters_json<C: SnowpipeHttpClient>(
    path: Option<&Path>,
    target_pipe_name: Option<&str>,
) -> Result<SimpleIngestManager<C>, SnowpipeError> {
    let path = path.unwrap_or(Path::new(DEFAULT_PARAMETERS_JSON_PATH));
    let params = ConnectionParameters::from_json_file(path)?;
    build_ingest_manager_from_parameters(&params, target_pipe_name)
}

/// Reads parameters from the `[snowflake]` table of a secrets file,
/// `.streamlit/secrets.toml` unless `path` is given.
pub fn build_ingest_manager_via_secrets_file<C: SnowpipeHttpClient>(
    path: Option<&Path>,
    target_pipe_name: Option<&str>,
) -> Result<SimpleIngestManager<C>, SnowpipeError> {
    let path = path.unwrap_or(Path::new(DEFAULT_SECRETS_FILE_PATH));
    let params = ConnectionParameters::from_secrets_file(path)?;
    build_ingest_manager_from_parameters(&params, target_pipe_name)
}

pub fn build_ingest_manager_via_environment_variables<C: SnowpipeHttpClient>(
    env: &impl EnvSource,
    target_pipe_name: Option<&str>,
) -> Result<SimpleIngestManager<C>, SnowpipeError> {
    let params = ConnectionParameters::from_environment(env)?;
    build_ingest_manager_from_parameters(&params, target_pipe_name)
}

pub fn build_ingest_manager_via_parameters_object<C: SnowpipeHttpClient>(
    imported_connection_parameters: RawConnectionParameters,
    target_pipe_name: Option<&str>,
) -> Result<SimpleIngestManager<C>, SnowpipeError> {
    let params = ConnectionParameters::resolve(imported_connection_parameters)?;
    build_ingest_manager_from_parameters(&params, target_pipe_name)
}

/// Builds an ingest manager whose private key is stored in `vault` as
/// `{user}__private_key`. See [`ConnectionParameters::from_vault`] for how
/// `lookup` and the environment are combined.
pub async fn build_ingest_manager_using_vault_private_key<C, V>(
    vault: &V,
    env: &impl EnvSource,
    lookup: &VaultLookup,
    target_pipe_name: Option<&str>,
) -> Result<SimpleIngestManager<C>, SnowpipeError>
where
    C: SnowpipeHttpClient,
    V: SecretVault,
{
    let params = ConnectionParameters::from_vault(vault, env, lookup).await?;
    build_ingest_manager_from_parameters(&params, target_pipe_name)
}
