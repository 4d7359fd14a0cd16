//! Log level selection shared by the Rackscan binaries

use tracing::Level;

/// Map a `--log-level` argument to a tracing level.
///
/// Matching is case-insensitive. Unknown names fall back to `default`.
pub fn parse_level(name: &str, default: Level) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_levels_ignore_case() {
        assert_eq!(parse_level("trace", Level::INFO), Level::TRACE);
        assert_eq!(parse_level("DEBUG", Level::INFO), Level::DEBUG);
        assert_eq!(parse_level("Warn", Level::INFO), Level::WARN);
        assert_eq!(parse_level("error", Level::INFO), Level::ERROR);
    }

    #[test]
    fn test_unknown_level_uses_default() {
        assert_eq!(parse_level("verbose", Level::WARN), Level::WARN);
        assert_eq!(parse_level("", Level::INFO), Level::INFO);
    }
}
