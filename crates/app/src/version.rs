use std::fmt;

use serde::Serialize;

/// Build metadata captured by the build script
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub crate_version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    pub build_target: &'static str,
    pub rust_version: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("REPO_VERSION"),
        crate_version: env!("CARGO_PKG_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        build_target: env!("BUILD_TARGET"),
        rust_version: env!("RUST_VERSION"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} ({})", self.name, self.crate_version, self.version)?;
        writeln!(f, "  profile: {}", self.build_profile)?;
        writeln!(f, "  built:   {}", self.build_timestamp)?;
        writeln!(f, "  target:  {}", self.build_target)?;
        write!(f, "  rustc:   {}", self.rust_version)
    }
}
