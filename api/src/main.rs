use clap::Parser;

use freelance_desk_api::{config::Config, run_server, tracing_config, Server};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();
    let config = Config::parse();

    tracing_config::configure()?;

    let Server {
        server, outbox, ..
    } = run_server(config).await?;

    server.await?;
    outbox.shutdown().await;

    Ok(())
}
