use anyhow::{Context, Result};
use prism_evaluator::scoring::MLHandle;
use prism_evaluator::service::serve;
use prism_evaluator::settings::settings;
use prism_evaluator::utils::{
    log_init, log_ml_step, log_probe_ok, log_service_summary, log_serving,
};
use prism_evaluator::Evaluator;
use std::sync::Arc;
use tokio::io::{stdin, stdout, BufReader};
use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("prism_evaluator=info".parse()?))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        );
    set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let s = settings();
    log_init(s);

    log_ml_step("Loading models (this may take a while on first run)...");
    let model = s.ml.embedding_model;
    let ml_handle = tokio::task::spawn_blocking(move || -> Result<MLHandle> {
        let handle = MLHandle::spawn(model).context("failed to load models")?;
        handle.probe().context("startup probe failed")?;
        Ok(handle)
    })
    .await??;
    log_probe_ok();

    let evaluator = Arc::new(Evaluator::with_models(ml_handle, s));

    log_serving(s.service.max_in_flight);
    let stats = serve(evaluator, BufReader::new(stdin()), stdout(), &s.service).await?;
    log_service_summary(&stats);

    Ok(())
}
