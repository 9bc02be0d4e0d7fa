//! Build metadata embedded by `build.rs`

use std::fmt;

/// What was built, from which commit, with which toolchain
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Short commit hash, or "unknown" outside a git checkout
    pub git_hash: &'static str,
    /// "true", "false" or "unknown"
    git_dirty: &'static str,
    pub build_timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc_version: &'static str,
}

const BUILD: BuildInfo = BuildInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("TEAMSKILLS_GIT_HASH"),
    git_dirty: env!("TEAMSKILLS_GIT_DIRTY"),
    build_timestamp: env!("TEAMSKILLS_BUILD_TIMESTAMP"),
    target: env!("TEAMSKILLS_TARGET"),
    profile: env!("TEAMSKILLS_PROFILE"),
    rustc_version: env!("TEAMSKILLS_RUSTC_VERSION"),
};

impl BuildInfo {
    pub fn is_dirty(&self) -> bool {
        self.git_dirty == "true"
    }

    /// `0.1.0-abc1234`, with `-dirty` for uncommitted builds
    pub fn full_version(&self) -> String {
        let dirty = if self.is_dirty() { "-dirty" } else { "" };
        format!("{}-{}{}", self.version, self.git_hash, dirty)
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f)?;
        writeln!(f, "Build Information:")?;
        for (label, value) in [
            ("Git Hash", self.git_hash),
            ("Built", self.build_timestamp),
            ("Profile", self.profile),
            ("Target", self.target),
            ("Compiler", self.rustc_version),
        ] {
            writeln!(f, "  {:<10}  {}", format!("{}:", label), value)?;
        }
        Ok(())
    }
}

pub fn build_info() -> BuildInfo {
    BUILD
}

/// Print version information to stdout
pub fn print_version() {
    print!("{}", BUILD);
}
