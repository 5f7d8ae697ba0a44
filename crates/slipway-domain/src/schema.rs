use anyhow::{Context, Result};

/// Extracts the latest defined schema version from schema source text.
///
/// The version is whatever run of ASCII digits appears on the schema's
/// `define` line, separators ignored, so both `version: 20130101010101` and
/// `version: 2013_01_01_010101` parse to the same value. Returns 0 when no
/// definition line or no digits are present, meaning "no schema defined".
pub fn parse_schema_version(source: &str) -> Result<u64> {
    let Some(line) = source.lines().find(|line| line.contains("Schema.define")) else {
        return Ok(0);
    };
    let digits: String = line.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse::<u64>()
        .with_context(|| format!("schema version out of range: {digits}"))
}
