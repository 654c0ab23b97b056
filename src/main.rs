use clap::Parser;
use memesmith::config::setup_logging;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = memesmith::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let pipeline = match cli.providers.build_pipeline() {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!("Failed to set up providers: {:#}", err);
            return;
        }
    };

    if let Err(err) = memesmith::web::setup_server(
        &cli.listen_address,
        cli.port,
        pipeline,
        cli.session_idle_minutes,
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
