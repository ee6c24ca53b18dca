//! Configuration file discovery and environment interpolation.
//!
//! Both the models section and the tasks section live in one YAML file,
//! `_config/config.yaml`. It is located by checking `TASKCHAT_PROJECT_ROOT`
//! first, then walking upward from a start directory. Before parsing, every
//! `${VAR}` / `${VAR:-default}` in the raw text is replaced from the
//! environment, so API keys never have to be written into the file.

use std::path::{Path, PathBuf};

/// Location of the config file relative to a project root.
pub const CONFIG_RELATIVE_PATH: &str = "_config/config.yaml";

/// Env var that pins the project root.
pub const PROJECT_ROOT_ENV: &str = "TASKCHAT_PROJECT_ROOT";

// ─── Discovery ───────────────────────────────────────────────────────────────

/// Find `_config/config.yaml`, or `None` when no project root has one.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    if let Ok(root) = std::env::var(PROJECT_ROOT_ENV) {
        let candidate = PathBuf::from(&root).join(CONFIG_RELATIVE_PATH);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_RELATIVE_PATH);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Read a config file and interpolate environment variables.
pub fn read_interpolated(path: &Path) -> std::io::Result<String> {
    let raw = std::fs::read_to_string(path)?;
    Ok(interpolate_env_vars(&raw))
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
pub(crate) fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve `VAR` or `VAR:-default`. Unset variables without a default
/// become the empty string.
fn resolve_var_expr(expr: &str) -> String {
    match expr.split_once(":-") {
        Some((name, default)) => std::env::var(name).unwrap_or_else(|_| expand_tilde(default)),
        None => std::env::var(expr).unwrap_or_default(),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_with_default() {
        std::env::remove_var("__TASKCHAT_UNSET_VAR__");
        let result = interpolate_env_vars("key: ${__TASKCHAT_UNSET_VAR__:-fallback}");
        assert_eq!(result, "key: fallback");
    }

    #[test]
    fn test_interpolate_with_value() {
        std::env::set_var("__TASKCHAT_API_KEY__", "sk-test");
        let result = interpolate_env_vars("api_key: \"${__TASKCHAT_API_KEY__}\"");
        assert_eq!(result, "api_key: \"sk-test\"");
        std::env::remove_var("__TASKCHAT_API_KEY__");
    }

    #[test]
    fn test_interpolate_unset_without_default_is_empty() {
        std::env::remove_var("__TASKCHAT_MISSING__");
        assert_eq!(interpolate_env_vars("[${__TASKCHAT_MISSING__}]"), "[]");
    }

    #[test]
    fn test_interpolate_leaves_plain_text() {
        let input = "price: $5 and {braces}";
        assert_eq!(interpolate_env_vars(input), input);
    }

    #[test]
    fn test_expand_tilde() {
        let result = expand_tilde("~/logs");
        assert!(!result.starts_with('~'), "tilde should be expanded");
        assert!(result.ends_with("/logs"));
    }

    #[test]
    fn test_find_config_path_walks_upward() {
        let root = tempfile::tempdir().unwrap();
        let config_dir = root.path().join("_config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.yaml"), "tasks: {}\n").unwrap();

        let nested = root.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_path(&nested).expect("config should be found");
        assert_eq!(found, root.path().join(CONFIG_RELATIVE_PATH));
    }

    #[test]
    fn test_read_interpolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "model: ${__TASKCHAT_NOPE__:-deepseek-chat}\n").unwrap();
        let text = read_interpolated(&path).unwrap();
        assert_eq!(text, "model: deepseek-chat\n");
    }
}
