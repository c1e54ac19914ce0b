//! Inspector configuration.
//!
//! Options come from CLI arguments, with `ZEQ_INSPECT_*` environment
//! variables as fallbacks for the global ones.
//!
//! # Example
//!
//! ```no_run
//! use zeq_inspect::InspectConfig;
//!
//! let config = InspectConfig::from_args();
//! config.validate().expect("Invalid configuration");
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use zeq_formats::wld::{BITMAP_NAME_SUFFIX, FragmentKind, WldOptions};

use crate::error::ConfigError;

/// Inspector configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "zeq-inspect",
    about = "Inspect S3D archives and the WLD fragment streams inside them",
    version
)]
pub struct InspectConfig {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "ZEQ_INSPECT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Print JSON instead of text
    #[arg(long, global = true, env = "ZEQ_INSPECT_JSON")]
    pub json: bool,

    /// Fail on fragments whose payload is not fully consumed
    #[arg(long, global = true, env = "ZEQ_INSPECT_STRICT")]
    pub strict: bool,

    /// Suffix appended to decoded bitmap names
    #[arg(
        long,
        global = true,
        env = "ZEQ_INSPECT_BITMAP_SUFFIX",
        default_value = BITMAP_NAME_SUFFIX
    )]
    pub bitmap_suffix: String,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Inspector commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the entries of an archive
    List {
        /// Archive path
        archive: PathBuf,
    },

    /// Write archive entries to a directory
    Extract {
        /// Archive path
        archive: PathBuf,
        /// Output directory, created if missing
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Only extract entries with these names
        entries: Vec<String>,
    },

    /// Dump the fragments of a WLD stream inside an archive
    Fragments {
        /// Archive path
        archive: PathBuf,
        /// WLD entry name; defaults to the first `.wld` entry
        #[arg(short, long)]
        wld: Option<String>,
        /// Only show fragments of this type tag, such as `0x36`
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Resolve the texture lists of a WLD stream
    Textures {
        /// Archive path
        archive: PathBuf,
        /// WLD entry name; defaults to the first `.wld` entry
        #[arg(short, long)]
        wld: Option<String>,
    },

    /// Summarize every archive of a zone
    Zone {
        /// Directory holding the zone archives
        dir: PathBuf,
        /// Zone short name, such as `gfaydark`
        short_name: String,
    },
}

impl InspectConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse options for the WLD decoder.
    #[must_use]
    pub fn wld_options(&self) -> WldOptions {
        WldOptions {
            strict_length: self.strict,
            ..WldOptions::default()
        }
        .with_bitmap_suffix(self.bitmap_suffix.clone())
    }

    /// Fragment type filter of the `fragments` command, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKind` if the filter is not a supported tag.
    pub fn kind_filter(&self) -> Result<Option<FragmentKind>, ConfigError> {
        let Command::Fragments {
            kind: Some(kind), ..
        } = &self.command
        else {
            return Ok(None);
        };
        parse_kind(kind).map(Some)
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - An input archive or zone directory doesn't exist
    /// - The extract output path exists but is not a directory
    /// - The fragment type filter is not a supported tag
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.command {
            Command::List { archive }
            | Command::Fragments { archive, .. }
            | Command::Textures { archive, .. } => require_file(archive)?,
            Command::Extract {
                archive, output, ..
            } => {
                require_file(archive)?;
                if output.exists() && !output.is_dir() {
                    return Err(ConfigError::InvalidOutput {
                        path: output.clone(),
                        reason: "not a directory".to_string(),
                    });
                }
            }
            Command::Zone { dir, .. } => {
                if !dir.is_dir() {
                    return Err(ConfigError::MissingInput(dir.clone()));
                }
            }
        }

        self.kind_filter()?;
        Ok(())
    }
}

fn require_file(path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::MissingInput(path.to_path_buf()))
    }
}

/// Parse a type tag written as hex (`0x36`, `36`) into a supported kind.
fn parse_kind(text: &str) -> Result<FragmentKind, ConfigError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(FragmentKind::from_tag)
        .ok_or_else(|| ConfigError::InvalidKind(text.to_string()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> InspectConfig {
        InspectConfig::try_parse_from(std::iter::once("zeq-inspect").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let config = parse(&["list", "gfaydark.s3d", "--json", "--strict"]);
        assert!(config.json);
        assert!(config.strict);
        assert_eq!(config.log_level, "info");
        assert!(config.wld_options().strict_length);
        assert_eq!(config.wld_options().bitmap_suffix, "_Material");
    }

    #[test]
    fn test_kind_filter_parsing() {
        assert_eq!(parse_kind("0x36").unwrap(), FragmentKind::Mesh);
        assert_eq!(parse_kind("31").unwrap(), FragmentKind::TextureList);
        assert!(matches!(parse_kind("0x22"), Err(ConfigError::InvalidKind(_))));
        assert!(matches!(parse_kind("mesh"), Err(ConfigError::InvalidKind(_))));

        let config = parse(&["fragments", "a.s3d", "--kind", "0x15"]);
        assert_eq!(config.kind_filter().unwrap(), Some(FragmentKind::ObjectPlacement));
    }

    #[test]
    fn test_validate_inputs() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("zone.s3d");
        std::fs::write(&archive, b"").unwrap();
        let archive = archive.to_str().unwrap();

        assert!(parse(&["list", archive]).validate().is_ok());
        assert!(matches!(
            parse(&["list", "/nonexistent/zone.s3d"]).validate(),
            Err(ConfigError::MissingInput(_))
        ));

        // An existing file cannot be the output directory
        assert!(matches!(
            parse(&["extract", archive, "--output", archive]).validate(),
            Err(ConfigError::InvalidOutput { .. })
        ));

        let dir_arg = dir.path().to_str().unwrap();
        assert!(parse(&["zone", dir_arg, "gfaydark"]).validate().is_ok());
        assert!(matches!(
            parse(&["zone", archive, "gfaydark"]).validate(),
            Err(ConfigError::MissingInput(_))
        ));

        assert!(matches!(
            parse(&["fragments", archive, "--kind", "0x99"]).validate(),
            Err(ConfigError::InvalidKind(_))
        ));
    }
}
