use std::path::Path;

use derive_builder::Builder;
use serde::Deserialize;

use super::{ConnectionParameters, RawConnectionParameters, env::explicit_or_env};
use crate::{SnowpipeError, error, params::EnvSource, this_errors, vault::SecretVault};

pub const DEFAULT_PARAMETERS_JSON_PATH: &str = "snowflake_connection_parameters.json";
pub const DEFAULT_SECRETS_FILE_PATH: &str = ".streamlit/secrets.toml";

const SECRETS_TABLE: &str = "snowflake";

const ENV_ACCOUNT: &str = "SNOWFLAKE_ACCOUNT";
const ENV_USER: &str = "SNOWFLAKE_USER";
const ENV_DEFAULT_ROLE: &str = "SNOWFLAKE_DEFAULT_ROLE";
const ENV_DEFAULT_WAREHOUSE: &str = "SNOWFLAKE_DEFAULT_WAREHOUSE";
const ENV_DEFAULT_DATABASE: &str = "SNOWFLAKE_DEFAULT_DATABASE";
const ENV_DEFAULT_SCHEMA: &str = "SNOWFLAKE_DEFAULT_SCHEMA";
const ENV_PRIVATE_KEY_PATH: &str = "SNOWFLAKE_PRIVATE_KEY_PATH";
const ENV_PRIVATE_KEY_PLAIN_TEXT: &str = "SNOWFLAKE_PRIVATE_KEY_PLAIN_TEXT";
const ENV_PRIVATE_KEY_PASSPHRASE: &str = "SNOWFLAKE_PRIVATE_KEY_PASSPHRASE";
const ENV_PASSWORD: &str = "SNOWFLAKE_PASSWORD";

/// Explicit values for the vault-backed source. Anything left empty is read
/// from the matching `SNOWFLAKE_*` environment variable instead.
#[derive(Builder, Debug, Clone, Default)]
#[builder(default)]
pub struct VaultLookup {
    #[builder(setter(into, strip_option))]
    pub user: Option<String>,

    #[builder(setter(into, strip_option))]
    pub account: Option<String>,

    #[builder(setter(into, strip_option))]
    pub default_role: Option<String>,

    #[builder(setter(into, strip_option))]
    pub default_warehouse: Option<String>,

    #[builder(setter(into, strip_option))]
    pub default_database: Option<String>,

    #[builder(setter(into, strip_option))]
    pub default_schema: Option<String>,
}

/// Name of the vault secret holding `user`'s private key.
pub fn private_key_secret_name(user: &str) -> String {
    format!("{}__private_key", user)
}

#[derive(Deserialize)]
struct SecretsFile {
    snowflake: Option<RawConnectionParameters>,
}

impl ConnectionParameters {
    /// Loads parameters from a local JSON file holding a single object in the
    /// documented format.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SnowpipeError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading connection parameters from json file");

        let contents = this_errors!(
            Resolution,
            "failed to read connection parameters file",
            std::fs::read_to_string(path)
        );

        let raw = this_errors!(
            Resolution,
            "failed to parse connection parameters file as json",
            serde_json::from_str::<RawConnectionParameters>(&contents)
        );

        Self::resolve(raw)
    }

    /// Loads parameters from the `[snowflake]` table of a Streamlit-style TOML
    /// secrets file.
    pub fn from_secrets_file(path: impl AsRef<Path>) -> Result<Self, SnowpipeError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading connection parameters from secrets file");

        let contents = this_errors!(
            Resolution,
            "failed to read secrets file",
            std::fs::read_to_string(path)
        );

        let secrets = this_errors!(
            Resolution,
            "failed to parse secrets file as toml",
            toml::from_str::<SecretsFile>(&contents)
        );

        let raw = secrets.snowflake.ok_or_else(|| {
            error!(
                Resolution,
                message = format!("secrets file has no [{}] table", SECRETS_TABLE)
            )
        })?;

        Self::resolve(raw)
    }

    /// Loads parameters from `SNOWFLAKE_*` environment variables.
    pub fn from_environment(env: &impl EnvSource) -> Result<Self, SnowpipeError> {
        tracing::debug!("loading connection parameters from environment variables");

        let raw = RawConnectionParameters {
            account: env.var(ENV_ACCOUNT),
            user: env.var(ENV_USER),
            default_role: env.var(ENV_DEFAULT_ROLE),
            default_warehouse: env.var(ENV_DEFAULT_WAREHOUSE),
            default_database: env.var(ENV_DEFAULT_DATABASE),
            default_schema: env.var(ENV_DEFAULT_SCHEMA),
            private_key_path: env.var(ENV_PRIVATE_KEY_PATH),
            private_key_plain_text: env.var(ENV_PRIVATE_KEY_PLAIN_TEXT),
            private_key_passphrase: env.var(ENV_PRIVATE_KEY_PASSPHRASE),
            password: env.var(ENV_PASSWORD),
        };

        Self::resolve(raw)
    }

    /// Builds parameters around a private key stored in a secret vault under
    /// `{user}__private_key`.
    ///
    /// User and account must resolve, from `lookup` or the environment, before
    /// the vault is queried. Role, warehouse, database and schema may stay
    /// unset. Vault errors are returned as the vault reported them.
    pub async fn from_vault<V: SecretVault>(
        vault: &V,
        env: &impl EnvSource,
        lookup: &VaultLookup,
    ) -> Result<Self, SnowpipeError> {
        let [user, account, default_role, default_warehouse, default_database, default_schema] = [
            (lookup.user.as_deref(), ENV_USER),
            (lookup.account.as_deref(), ENV_ACCOUNT),
            (lookup.default_role.as_deref(), ENV_DEFAULT_ROLE),
            (lookup.default_warehouse.as_deref(), ENV_DEFAULT_WAREHOUSE),
            (lookup.default_database.as_deref(), ENV_DEFAULT_DATABASE),
            (lookup.default_schema.as_deref(), ENV_DEFAULT_SCHEMA),
        ]
        .map(|(explicit, key)| explicit_or_env(explicit, key, env));

        let user = user.ok_or_else(|| {
            error!(
                Configuration,
                "missing required connection parameter: user (argument or SNOWFLAKE_USER)"
            )
        })?;

        if account.is_none() {
            return Err(error!(
                Configuration,
                "missing required connection parameter: account (argument or SNOWFLAKE_ACCOUNT)"
            ));
        }

        let secret_name = private_key_secret_name(&user);
        tracing::debug!(
            secret = secret_name.as_str(),
            "retrieving private key from secret vault"
        );

        let private_key = vault.get_secret(&secret_name).await?;

        Self::resolve(RawConnectionParameters {
            account,
            user: Some(user),
            default_role,
            default_warehouse,
            default_database,
            default_schema,
            private_key_plain_text: Some(private_key),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        io::Write,
        sync::{Arc, Mutex},
    };

    use super::*;
    use crate::{ErrorKind, params::Credential};

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[derive(Clone, Default)]
    struct FakeVault {
        secrets: HashMap<String, String>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    impl FakeVault {
        fn with_secret(name: &str, value: &str) -> Self {
            let mut vault = FakeVault::default();
            vault.secrets.insert(name.to_string(), value.to_string());
            vault
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl SecretVault for FakeVault {
        async fn get_secret(&self, name: &str) -> Result<String, SnowpipeError> {
            self.requested.lock().unwrap().push(name.to_string());
            self.secrets
                .get(name)
                .cloned()
                .ok_or_else(|| error!(Resolution, message = format!("SecretNotFound: {name}")))
        }
    }

    #[test]
    fn json_file_is_resolved() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "account": "abc123",
                "user": "loader",
                "default_role": "None",
                "default_warehouse": "LOAD_WH",
                "default_database": "None",
                "default_schema": "None",
                "private_key_path": "None",
                "private_key_plain_text": "pem-text",
                "private_key_passphrase": "None",
                "password": "ignored"
            }}"#
        )
        .unwrap();

        let params = ConnectionParameters::from_json_file(file.path()).unwrap();

        assert_eq!(params.account(), "abc123");
        assert_eq!(params.default_warehouse(), Some("LOAD_WH"));
        assert_eq!(params.default_role(), None);
        assert_eq!(
            params.credential(),
            &Credential::PrivateKeyPlainText("pem-text".into())
        );
    }

    #[test]
    fn missing_json_file_is_a_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConnectionParameters::from_json_file(dir.path().join(DEFAULT_PARAMETERS_JSON_PATH))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn malformed_json_file_is_a_resolution_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = ConnectionParameters::from_json_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn json_file_without_user_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"account": "abc123", "password": "pw"}}"#).unwrap();

        let err = ConnectionParameters::from_json_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn secrets_file_reads_snowflake_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[other]
token = "x"

[snowflake]
account = "abc123"
user = "loader"
default_schema = "LANDING"
private_key_path = "keys/rsa_key.p8"
"#
        )
        .unwrap();

        let params = ConnectionParameters::from_secrets_file(file.path()).unwrap();

        assert_eq!(params.default_schema(), Some("LANDING"));
        assert_eq!(params.credential().method(), "private_key_path");
    }

    #[test]
    fn secrets_file_without_table_is_a_resolution_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[other]\ntoken = \"x\"\n").unwrap();

        let err = ConnectionParameters::from_secrets_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(err.message().contains("[snowflake]"));
    }

    #[test]
    fn environment_is_resolved() {
        let env = env(&[
            ("SNOWFLAKE_ACCOUNT", "abc123"),
            ("SNOWFLAKE_USER", "loader"),
            ("SNOWFLAKE_DEFAULT_DATABASE", "RAW"),
            ("SNOWFLAKE_PASSWORD", "pw"),
        ]);

        let params = ConnectionParameters::from_environment(&env).unwrap();

        assert_eq!(params.host(), "abc123.snowflakecomputing.com");
        assert_eq!(params.default_database(), Some("RAW"));
        assert_eq!(params.credential(), &Credential::Password("pw".into()));
    }

    #[test]
    fn empty_environment_fails() {
        let err = ConnectionParameters::from_environment(&HashMap::<String, String>::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn vault_user_falls_back_to_environment() {
        let vault = FakeVault::with_secret("env_user__private_key", "pem-from-vault");
        let env = env(&[
            ("SNOWFLAKE_USER", "env_user"),
            ("SNOWFLAKE_ACCOUNT", "env_account"),
            ("SNOWFLAKE_DEFAULT_ROLE", "ENV_ROLE"),
        ]);
        let lookup = VaultLookupBuilder::default()
            .user("")
            .default_role("EXPLICIT_ROLE")
            .build()
            .unwrap();

        let params = ConnectionParameters::from_vault(&vault, &env, &lookup)
            .await
            .unwrap();

        assert_eq!(vault.requested(), vec!["env_user__private_key".to_string()]);
        assert_eq!(params.user(), "env_user");
        assert_eq!(params.account(), "env_account");
        assert_eq!(params.default_role(), Some("EXPLICIT_ROLE"));
        assert_eq!(params.default_warehouse(), None);
        assert_eq!(
            params.credential(),
            &Credential::PrivateKeyPlainText("pem-from-vault".into())
        );
    }

    #[tokio::test]
    async fn vault_without_user_fails_before_lookup() {
        let vault = FakeVault::default();
        let env = env(&[("SNOWFLAKE_ACCOUNT", "abc123")]);

        let err = ConnectionParameters::from_vault(&vault, &env, &VaultLookup::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(vault.requested().is_empty());
    }

    #[tokio::test]
    async fn vault_with_none_user_fails_before_lookup() {
        let vault = FakeVault::default();
        let env = env(&[("SNOWFLAKE_USER", "None"), ("SNOWFLAKE_ACCOUNT", "abc123")]);

        let err = ConnectionParameters::from_vault(&vault, &env, &VaultLookup::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(vault.requested().is_empty());
    }

    #[tokio::test]
    async fn vault_none_user_argument_falls_back_to_environment() {
        let vault = FakeVault::with_secret("env_user__private_key", "pem-from-vault");
        let env = env(&[("SNOWFLAKE_USER", "env_user"), ("SNOWFLAKE_ACCOUNT", "abc123")]);
        let lookup = VaultLookupBuilder::default().user("None").build().unwrap();

        let params = ConnectionParameters::from_vault(&vault, &env, &lookup)
            .await
            .unwrap();

        assert_eq!(vault.requested(), vec!["env_user__private_key".to_string()]);
        assert_eq!(params.user(), "env_user");
    }

    #[tokio::test]
    async fn vault_errors_propagate_unchanged() {
        let vault = FakeVault::default();
        let lookup = VaultLookupBuilder::default()
            .user("loader")
            .account("abc123")
            .build()
            .unwrap();

        let err = ConnectionParameters::from_vault(&vault, &HashMap::<String, String>::new(), &lookup)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert_eq!(err.message(), "SecretNotFound: loader__private_key");
    }
}
