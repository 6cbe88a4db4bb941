//! Environment variable handling.

use std::env;
use std::path::Path;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable as a u16 (e.g., for ports).
pub fn get_u16(name: &str) -> Option<u16> {
    get_var(name).and_then(|v| v.trim().parse().ok())
}

/// Load `KEY=value` pairs from `.env` in the working directory.
///
/// Variables that are already set are left alone.
pub fn load_dotenv() -> Result<usize, std::io::Error> {
    load_dotenv_from(Path::new(".env"))
}

/// Load `KEY=value` pairs from the given file, returning how many were set.
pub fn load_dotenv_from(path: &Path) -> Result<usize, std::io::Error> {
    if !path.exists() {
        return Ok(0);
    }

    let content = std::fs::read_to_string(path)?;
    let mut applied = 0;
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            env::set_var(&key, value);
            applied += 1;
        }
    }
    Ok(applied)
}

/// Parse dotenv content into key/value pairs.
fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Common environment variable names.
pub mod vars {
    /// Default variable holding the DeepSeek API key.
    pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";

    /// Gateway port override.
    pub const PORT: &str = "PORT";

    /// Config file override.
    pub const PARLEY_CONFIG: &str = "PARLEY_CONFIG";
}
