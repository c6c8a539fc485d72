use std::io::IsTerminal;
use std::path::PathBuf;

use directories::BaseDirs;

use crate::Cli;
use crate::lib::cli::OutputFormat;

#[derive(Clone, Debug)]
pub struct Config {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub output: OutputFormat,
    pub color: bool,
    pub show_progress: bool,
}

impl Config {
    pub fn new(
        kubeconfig: Option<PathBuf>,
        context: Option<String>,
        output: OutputFormat,
        color: bool,
        show_progress: bool,
    ) -> Self {
        Self {
            kubeconfig,
            context,
            output,
            color,
            show_progress,
        }
    }

    /// Colors only when stdout is a terminal and the user did not opt out;
    /// the progress bar only for table output on an interactive stderr
    pub fn from_cli(cli: &Cli) -> Self {
        let color = !cli.no_color && std::io::stdout().is_terminal();
        let show_progress = !cli.quiet
            && cli.output == OutputFormat::Table
            && std::io::stderr().is_terminal();

        Self::new(
            cli.kubeconfig.clone(),
            cli.context.clone(),
            cli.output.clone(),
            color,
            show_progress,
        )
    }

    /// Explicit `--kubeconfig`, else `~/.kube/config`
    pub fn kubeconfig_path(&self) -> Option<PathBuf> {
        self.kubeconfig.clone().or_else(default_kubeconfig)
    }
}

fn default_kubeconfig() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".kube").join("config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_explicit_kubeconfig_wins() {
        let config = Config::new(
            Some(PathBuf::from("/etc/kube/admin.conf")),
            None,
            OutputFormat::Table,
            false,
            false,
        );
        assert_eq!(
            config.kubeconfig_path(),
            Some(PathBuf::from("/etc/kube/admin.conf"))
        );
    }

    #[test]
    fn test_default_kubeconfig_under_home() {
        let config = Config::new(None, None, OutputFormat::Table, false, false);
        if let Some(path) = config.kubeconfig_path() {
            assert!(path.ends_with(".kube/config"));
        }
    }

    #[test]
    fn test_no_color_flag_disables_color() {
        let cli = Cli::try_parse_from(["kubemem", "--no-color", "pv"]).unwrap();
        let config = Config::from_cli(&cli);
        assert!(!config.color);
    }

    #[test]
    fn test_json_output_hides_progress() {
        let cli = Cli::try_parse_from(["kubemem", "usage", "--output", "json"]).unwrap();
        let config = Config::from_cli(&cli);
        assert!(!config.show_progress);
        assert_eq!(config.output, OutputFormat::Json);
    }
}
