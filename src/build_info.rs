//! Build metadata captured by vergen at compile time

pub const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");
pub const CARGO_OPT_LEVEL: &str = env!("VERGEN_CARGO_OPT_LEVEL");
pub const CARGO_TARGET_TRIPLE: &str = env!("VERGEN_CARGO_TARGET_TRIPLE");
pub const RUSTC_SEMVER: &str = env!("VERGEN_RUSTC_SEMVER");

/// Package version plus target, e.g. `hollow-night 0.1.0 (x86_64-unknown-linux-gnu, opt3)`
pub fn version_string() -> String {
    format!(
        "{} {} ({}, opt{})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        CARGO_TARGET_TRIPLE,
        CARGO_OPT_LEVEL
    )
}

/// One line per fact, for the overlay and the startup log
pub fn detailed_info() -> String {
    format!("Built: {BUILD_TIMESTAMP}\nRustc: {RUSTC_SEMVER}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_names_package() {
        let version = version_string();
        assert!(version.starts_with("hollow-night "));
        assert!(version.contains(CARGO_TARGET_TRIPLE));
    }
}
