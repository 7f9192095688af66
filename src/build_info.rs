//! Compile-time build metadata
//!
//! `build.rs` exports the build counter and timestamp as environment variables.

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Build timestamp in ISO 8601 format
pub const BUILD_TIMESTAMP: &str = match option_env!("CALFLASH_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

/// Build counter, 0 when built without the build script
pub const BUILD_NUMBER: u64 = match option_env!("CALFLASH_BUILD_NUMBER") {
    Some(s) => digits_to_u64(s.as_bytes()),
    None => 0,
};

/// Decimal digits to u64; any other byte yields 0
const fn digits_to_u64(digits: &[u8]) -> u64 {
    let mut value = 0u64;
    let mut i = 0;
    while i < digits.len() {
        let d = digits[i];
        if !d.is_ascii_digit() {
            return 0;
        }
        value = value * 10 + (d - b'0') as u64;
        i += 1;
    }
    value
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
        }
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} (build {}, {})", self.name, self.version, self.build_number, self.build_timestamp)
    }
}

/// Print the startup banner to stderr; stdout belongs to the MCP transport
pub fn print_startup_banner(model: &str) {
    eprintln!("-----------------------------------------------");
    eprintln!("  Calorie Flash");
    eprintln!("  {}", BuildInfo::current());
    eprintln!("  Vision model: {}", model);
    eprintln!("-----------------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_to_u64() {
        assert_eq!(digits_to_u64(b"42"), 42);
        assert_eq!(digits_to_u64(b""), 0);
        assert_eq!(digits_to_u64(b"4x"), 0);
    }

    #[test]
    fn test_display() {
        let shown = BuildInfo::current().to_string();
        assert!(shown.starts_with("calflash v"));
    }
}
