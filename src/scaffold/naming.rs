//! Project name and Laravel version validation

use super::ScaffoldError;

pub const DEFAULT_LARAVEL_VERSION: u8 = 12;
pub const MINIMAL_LARAVEL_VERSION: u8 = 10;

/// Lowercase, keep `[a-z0-9-]`, turn everything else into separators and
/// collapse runs of `-`
pub fn to_kebab_case(input: &str) -> String {
    input
        .to_lowercase()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .flat_map(|word| word.split('-'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalized project name; also the database name and host prefix
pub fn project_name(raw: &str) -> Result<String, ScaffoldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ScaffoldError::InvalidName("project name cannot be empty".to_string()));
    }
    let name = to_kebab_case(raw);
    if name.is_empty() {
        return Err(ScaffoldError::InvalidName(format!(
            "'{}' has no usable characters after formatting",
            raw
        )));
    }
    Ok(name)
}

pub fn laravel_version(raw: Option<&str>) -> Result<u8, ScaffoldError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_LARAVEL_VERSION),
        Some(raw) => raw,
    };
    let version: u8 = raw.parse().map_err(|_| {
        ScaffoldError::InvalidVersion(format!(
            "'{}' is not a whole version number (e.g. {})",
            raw, DEFAULT_LARAVEL_VERSION
        ))
    })?;
    if version < MINIMAL_LARAVEL_VERSION {
        return Err(ScaffoldError::InvalidVersion(format!(
            "{} is below the minimum supported version {}",
            version, MINIMAL_LARAVEL_VERSION
        )));
    }
    Ok(version)
}
