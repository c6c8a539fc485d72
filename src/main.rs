use clap::Parser;
use log::{debug, info};
use kubemem::{
    Cli, Command, Config, KubernetesLoader, PodProgress, Result, init_logger, report_pv_affinity,
    report_usage, write_pv_report, write_usage_report,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.verbose, cli.quiet)?;

    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        debug!("A rustls crypto provider was already installed");
    }

    let config = Config::from_cli(&cli);
    debug!("Kubeconfig: {:?}", config.kubeconfig_path());
    debug!("Context: {:?}", config.context);

    let loader = KubernetesLoader::new(&config).await?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Usage { namespace } => {
            info!("Starting memory usage report");
            let progress = PodProgress::new(config.show_progress);
            let entries = report_usage(&loader, namespace.as_deref(), &progress).await;
            progress.finish();

            write_usage_report(&mut stdout, entries?, namespace, &config.output, config.color)?;
        }
        Command::Pv => {
            info!("Starting persistent volume affinity report");
            let rows = report_pv_affinity(&loader).await?;

            write_pv_report(&mut stdout, rows, &config.output, config.color)?;
        }
    }

    Ok(())
}
