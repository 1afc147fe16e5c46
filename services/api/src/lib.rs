mod cli;
mod evaluate;
mod infra;
mod routes;
mod server;

use battery_health::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
