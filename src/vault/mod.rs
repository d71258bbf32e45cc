use core::future::Future;

use crate::SnowpipeError;

pub mod azure;

pub use azure::{AzureKeyVault, AzureKeyVaultSettings, AzureKeyVaultSettingsBuilder};

/// A remote store that hands out secrets by name.
pub trait SecretVault {
    fn get_secret(&self, name: &str)
    -> impl Future<Output = Result<String, SnowpipeError>> + Send;
}
