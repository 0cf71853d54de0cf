//! Command line configuration.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

use crate::markdown::RenderOptions;
use crate::mode::ModeConfig;

/// Path meaning "read from standard input".
pub const STDIN_PATH: &str = "-";

/// Largest accepted tab stop width.
const MAX_TAB_SIZE: usize = 16;

/// Command line configuration for markmode.
#[derive(Debug, Clone, Parser)]
#[command(name = "markmode", version, about, long_about = None)]
pub struct Config {
    /// Markdown file to render, `-` for standard input
    #[arg(default_value = STDIN_PATH)]
    pub input: PathBuf,

    /// Output file, standard output when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Wrap the result in a complete HTML document
    #[arg(short, long)]
    pub standalone: bool,

    /// Document title for standalone output
    #[arg(long)]
    pub title: Option<String>,

    /// Tab stop width used by indentation aware modes
    #[arg(long, default_value_t = crate::mode::DEFAULT_TAB_SIZE)]
    pub tab_size: usize,

    /// Leave `$` untouched instead of producing math spans
    #[arg(long)]
    pub no_math: bool,

    /// Leave `:shortcode:` untouched instead of substituting emoji
    #[arg(long)]
    pub no_emoji: bool,

    /// Print the registered mode names and exit
    #[arg(long)]
    pub list_modes: bool,

    /// Log debug output to standard error
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the input file does not exist or the tab size is
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        if !self.reads_stdin() && !self.list_modes && !self.input.exists() {
            bail!("Input file does not exist: {}", self.input.display());
        }

        if self.tab_size == 0 || self.tab_size > MAX_TAB_SIZE {
            bail!(
                "Tab size must be between 1 and {}, got {}",
                MAX_TAB_SIZE,
                self.tab_size
            );
        }

        Ok(())
    }

    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == STDIN_PATH
    }

    /// Title for standalone output: explicit, else the input file stem.
    pub fn document_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }

        if self.reads_stdin() {
            return "Document".to_string();
        }

        self.input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(String::from)
            .unwrap_or_else(|| "Document".to_string())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            math: !self.no_math,
            emoji: !self.no_emoji,
        }
    }

    pub fn mode_config(&self) -> ModeConfig {
        ModeConfig {
            tab_size: self.tab_size,
        }
    }

    /// Tracing filter directive used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}
