use std::collections::HashMap;

/// Read-only view of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Trims `value` and drops it when it is blank or the literal `None`.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "None")
}

/// Returns the explicit value when it is present, otherwise the value of
/// `key` in `env`. Blank and `None` values count as unset on both sides.
pub(crate) fn explicit_or_env(
    explicit: Option<&str>,
    key: &str,
    env: &impl EnvSource,
) -> Option<String> {
    present(explicit.map(str::to_string)).or_else(|| present(env.var(key)))
}
