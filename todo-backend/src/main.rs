use anyhow::Context;
use todo_backend::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!(
        "mutation delay {:?}, store latency {:?}",
        config.mutation_delay,
        config.db_latency
    );

    let (addr, server) = todo_backend::start(config)
        .await
        .context("could not bind the listen address")?;
    log::info!("Server running on http://{addr}");

    server.await??;
    Ok(())
}
