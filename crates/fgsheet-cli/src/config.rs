// SPDX-License-Identifier: AGPL-3.0-or-later
//! Command line arguments and the optional TOML configuration file

use crate::commands::{CliError, Result, DEFAULT_MAX_SIZE};
use clap::Parser;
use fgsheet_core::{ExtractConfig, RenderConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(help = "Fantasy Grounds character export (.xml)")]
    pub input: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        help = "Output file or directory (defaults to the current directory)"
    )]
    pub output: Option<PathBuf>,

    #[arg(short = 'c', long = "config", help = "Path to configuration file")]
    pub config_file: Option<PathBuf>,

    #[arg(
        long = "max-size",
        env = "FGSHEET_MAX_SIZE",
        default_value_t = DEFAULT_MAX_SIZE,
        help = "Largest accepted export in bytes"
    )]
    pub max_size: u64,

    #[arg(long, help = "Print the sheet to stdout instead of writing a file")]
    pub stdout: bool,

    #[arg(long, help = "Print the extracted character model as JSON")]
    pub json: bool,

    #[arg(long = "expand-spells", help = "Render spell levels expanded")]
    pub expand_spells: bool,
}

/// Contents of the configuration file; every key is optional
///
/// ```toml
/// [extract]
/// spell_group_marker = "Spells"
///
/// [render]
/// expand_spell_levels = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub extract: ExtractConfig,
    pub render: RenderConfig,
}

impl Configuration {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply command line overrides
    pub fn with_arguments(mut self, arguments: &Arguments) -> Self {
        if arguments.expand_spells {
            self.render.expand_spell_levels = true;
        }
        self
    }
}
