use bespokeflow_rust::{logging, App, AppConfig};
use log::{error, info};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init("info");

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };
    info!("starting coordinator addr={} prefix={} local_workers={}",
          config.gateway.coordinator_addr(),
          config.gateway.prefix,
          config.workers.local);

    let app = match App::build(config) {
        Ok(app) => app,
        Err(e) => {
            error!("startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match app.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("coordinator failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
