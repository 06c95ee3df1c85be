//! Framework identity constants
//!
//! Central naming and version values shared by every Plat4m crate. Reference
//! these rather than hardcoding strings (e.g. in ASCII `$version` replies).

/// The framework name
pub const FRAMEWORK_NAME: &str = "Plat4m";

/// Framework version (synchronized with Cargo.toml)
pub const FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Full banner (name + version), e.g. for boot logs
pub const fn banner() -> &'static str {
    concat!("Plat4m v", env!("CARGO_PKG_VERSION"))
}
