use docrest_server::{config::Config, error::ServerError, init_tracing, run};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = Config::load()?;
    init_tracing(&config.log);

    run(config).await
}
