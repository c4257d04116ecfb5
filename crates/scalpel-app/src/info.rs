//! Process and build information shown at startup and served by `/health`.

use std::io;

use serde::Serialize;

use crate::error::{AppError, AppResult};

const UNKNOWN: &str = "unknown";

/// Identity of the running binary and host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    /// Application name.
    pub name: String,
    /// `os/arch` of the build target.
    pub platform: String,
    /// Toolchain the binary targets.
    pub runtime: String,
    /// Host the process runs on.
    pub hostname: String,
    /// Source revision baked in at build time.
    pub build_commit: String,
    /// Build date baked in at build time.
    pub build_date: String,
}

impl AppInfo {
    /// Gather information for the application `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Info`] when the hostname cannot be determined.
    pub fn gather(name: &str) -> AppResult<Self> {
        let hostname = host_name().map_err(|source| AppError::Info {
            field: "hostname",
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
            runtime: format!("rust {}", env!("CARGO_PKG_RUST_VERSION")),
            hostname,
            build_commit: option_env!("SCALPEL_BUILD_COMMIT")
                .unwrap_or(UNKNOWN)
                .to_string(),
            build_date: option_env!("SCALPEL_BUILD_DATE")
                .unwrap_or(UNKNOWN)
                .to_string(),
        })
    }

    /// Banner lines in display order.
    #[must_use]
    pub fn lines(&self) -> [&str; 6] {
        [
            self.name.as_str(),
            self.platform.as_str(),
            self.runtime.as_str(),
            self.hostname.as_str(),
            self.build_commit.as_str(),
            self.build_date.as_str(),
        ]
    }
}

fn host_name() -> io::Result<String> {
    let name = hostname::get()?.to_string_lossy().trim().to_string();
    if name.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "hostname is empty"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_fills_every_field() -> AppResult<()> {
        let info = AppInfo::gather("scalpel")?;
        assert_eq!(info.name, "scalpel");
        assert!(info.platform.contains('/'));
        assert!(info.runtime.starts_with("rust "));
        assert!(info.lines().iter().all(|line| !line.is_empty()));
        Ok(())
    }

    #[test]
    fn hostname_matches_the_operating_system() -> anyhow::Result<()> {
        let expected = hostname::get()?.to_string_lossy().trim().to_string();
        assert_eq!(AppInfo::gather("scalpel")?.hostname, expected);
        Ok(())
    }

    #[test]
    fn lines_follow_banner_order() {
        let info = AppInfo {
            name: "scalpel".to_string(),
            platform: "linux/x86_64".to_string(),
            runtime: "rust 1.91.0".to_string(),
            hostname: "node-1".to_string(),
            build_commit: "abc123".to_string(),
            build_date: "2026-01-01".to_string(),
        };
        assert_eq!(
            info.lines(),
            [
                "scalpel",
                "linux/x86_64",
                "rust 1.91.0",
                "node-1",
                "abc123",
                "2026-01-01"
            ]
        );
    }
}
