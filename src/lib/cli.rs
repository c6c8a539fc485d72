use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Kubernetes Memory Usage Reporter
///
/// Reports per-container memory usage against requests and limits for
/// running pods, and flags persistent volumes pinned to the same node.
#[derive(Parser, Debug)]
#[command(name = "kubemem", author, version, about, styles=get_styles())]
pub struct Cli {
    /// Path to the kubeconfig file [default: ~/.kube/config]
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Provide context name
    ///
    /// Use if you have multiple clusters in your kubeconfig
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress log output to stderr (logs still written to file)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format: table (default) or json
    #[arg(long, global = true, value_name = "FORMAT", default_value = "table")]
    pub output: OutputFormat,

    /// Disable colored table output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show memory usage against requests and limits for running pods
    Usage {
        /// Namespace to report on (default: all namespaces)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Show node affinity of persistent volumes and flag shared nodes
    Pv,
}

/// Output format for the reports
#[derive(Debug, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Column-aligned table
    Table,
    /// Output results as JSON
    Json,
}

/// Set color and variants for help description
///
/// Thanks to [Praveen Perera](https://stackoverflow.com/a/76916424)
fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}
