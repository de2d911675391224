//! Command line options.

use std::path::PathBuf;

use bpaf::Bpaf;

use crate::app::ShellConfig;

/// TabShell, a minimal tabbed web browser
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct CliOptions {
    /// Address to open in a new tab after the restored session
    #[bpaf(long("url"), argument("ADDRESS"))]
    pub url: Option<String>,

    /// Directory holding bookmarks.json and settings.json
    #[bpaf(long("data-dir"), argument("PATH"))]
    pub data_dir: Option<PathBuf>,

    /// Log filter in RUST_LOG syntax, e.g. `tabshell=debug`
    #[bpaf(long("log"), argument("FILTER"))]
    pub log: Option<String>,
}

impl CliOptions {
    pub fn shell_config(&self) -> ShellConfig {
        ShellConfig {
            data_dir: self.data_dir.clone(),
            startup_url: self.url.clone(),
        }
    }
}

/// Parses the process arguments, exiting with usage on error.
pub fn parse() -> CliOptions {
    cli_options().run()
}
