use std::io::IsTerminal as _;
use std::path::PathBuf;

use clap::{ColorChoice, Parser};

#[derive(Parser, Debug, Clone)]
pub struct Options {
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[arg(long, global = true, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// The cluster configuration file, in YAML or JSON
    #[arg(long, global = true, default_value = "kind-config.yaml")]
    pub config: PathBuf,
}

impl Options {
    /// Whether log output on stderr should use ANSI colors.
    pub fn use_color(&self) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => std::io::stderr().is_terminal(),
        }
    }
}
