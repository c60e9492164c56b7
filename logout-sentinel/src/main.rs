use std::fmt::{Debug, Display};

use logout_sentinel::{
    configuration::get_configuration, probe_worker::run_probe_until_stopped,
    startup::Application, telemetry,
};
use tokio::task::JoinError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing
    let subscriber =
        telemetry::get_subscriber("logout-sentinel".into(), "info".into(), std::io::stdout);
    telemetry::init_subscriber(subscriber);

    // Set up configuration
    let configuration = get_configuration().expect("failed to read configuration");

    let application = Application::build(configuration.clone()).await?;
    tracing::info!(
        "Sentinel listening on port {} in front of {}",
        application.port(),
        configuration.upstream.base_url
    );
    let application_task = tokio::spawn(application.run_until_stopped());
    let probe_task = tokio::spawn(run_probe_until_stopped(configuration));

    tokio::select! {
        o = application_task => report_exit("Gateway", o),
        o = probe_task => report_exit("Upstream probe", o),
    };

    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} task failed to complete",
                task_name
            )
        }
    }
}
