/*!
 * bucketprobe CLI - load configuration, then either run the one-shot
 * first-run bootstrap or serve metrics while the probe loop runs.
 */

use anyhow::Context;
use bucketprobe::{
    bootstrap, config::Config, fixture::Fixture, logging, metrics::PrometheusSink, probe::ProbeCycle,
    scheduler::Scheduler, server, store::S3Store,
};
use clap::Parser;
use prometheus::Registry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "bucketprobe")]
#[command(version, about = "Synthetic S3 probe exporting per-operation health as Prometheus metrics", long_about = None)]
struct Cli {
    /// Configuration file path (YAML or JSON)
    #[arg(long = "config", value_name = "PATH")]
    config: PathBuf,

    /// Initialize the bucket and seed the object expected by the download
    /// check, then exit
    #[arg(long = "first-run")]
    first_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    logging::init(&config.log)?;

    if config.s3.enable_locking_object_check {
        tracing::warn!("enable_locking_object_check is set but no locking probe exists; ignoring");
    }

    let fixture = Fixture::load(&config.s3.download_file_path, &config.s3.upload_file_path).await?;
    let store = S3Store::connect(config.store_config())
        .await
        .context("unable to create S3 client")?;

    if cli.first_run {
        bootstrap::first_run(
            &store,
            &config.s3.bucket,
            &config.s3.download_key,
            fixture.download_expected.clone(),
        )
        .await?;
        tracing::info!("first run complete");
        return Ok(());
    }

    let options = config.cycle_options();
    let registry = Registry::new();
    let sink = PrometheusSink::register(
        config.exporter.namespace(),
        &registry,
        &options.enabled_operations(),
    )
    .context("unable to register metrics")?;
    let cycle = ProbeCycle::new(Arc::new(store), Arc::new(fixture), options, Arc::new(sink));

    let cancel = CancellationToken::new();
    let mut server_task = tokio::spawn(server::serve(
        registry.clone(),
        config.exporter.port,
        config.exporter.path.clone(),
        cancel.clone(),
    ));
    let scheduler_task = Scheduler::new(cycle, config.exporter.interval(), cancel.clone()).spawn();

    let server_result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, stopping after the current cycle");
            cancel.cancel();
            server_task.await
        }
        result = &mut server_task => {
            // The endpoint died on its own (e.g. failed bind); stop probing.
            cancel.cancel();
            result
        }
    };

    let _ = scheduler_task.await;

    match server_result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(anyhow::anyhow!("metrics server task failed: {}", e)),
    }
}
