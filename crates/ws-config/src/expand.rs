//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Variable that was referenced without a default but is not set.
struct UnsetVar(String);

/// Expand `${VAR}` references in `value`.
///
/// `${VAR:-default}` falls back to `default` when `VAR` is unset. Bare `$VAR`
/// is left alone so literal dollar signs (passwords, URLs) survive.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |name| match std::env::var(name) {
        Ok(found) => Ok(Some(found)),
        Err(_) => Err(UnsetVar(name.to_owned())),
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand an optional value in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(text) = value.as_deref() {
        *value = Some(expand_env(text, field)?);
    }
    Ok(())
}
