//! Environment variable substitution for configuration text

use regex::{Captures, Regex};
use std::env;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// `${VAR}`, `${VAR:-fallback}` or `$VAR`
const ENV_VAR_PATTERN: &str = r"\$\{(\w+)(?::-([^}]*))?\}|\$(\w+)";

fn env_var_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(ENV_VAR_PATTERN).expect("env var pattern is a valid regex"))
}

/// Substitute environment variables in `content`.
///
/// Unset variables without a fallback keep their placeholder; validation
/// reports them later.
pub fn substitute_env_vars(content: &str) -> String {
    substitute_with(content, |name| env::var(name).ok())
}

/// Substitution against an arbitrary variable source
pub fn substitute_with<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_var_regex()
        .replace_all(content, |caps: &Captures| {
            let placeholder = &caps[0];
            let Some(name) = caps.get(1).or_else(|| caps.get(3)).map(|m| m.as_str()) else {
                return placeholder.to_string();
            };

            match (lookup(name), caps.get(2)) {
                (Some(value), _) => {
                    debug!(var = name, "Substituting environment variable");
                    value
                }
                (None, Some(fallback)) => {
                    debug!(var = name, "Environment variable not set, using fallback");
                    fallback.as_str().to_string()
                }
                (None, None) => {
                    warn!(var = name, "Environment variable not set");
                    placeholder.to_string()
                }
            }
        })
        .into_owned()
}

/// Names of the placeholders left in `content`
pub fn unresolved_env_vars(content: &str) -> Vec<String> {
    env_var_regex()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(3)).map(|m| m.as_str().to_string()))
        .collect()
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    env_var_regex().is_match(content)
}
