use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use marketing_admin::config::Config;
use marketing_admin::Error;

#[actix_web::main]
async fn main() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    let config = Config::from_env()?;

    marketing_admin::run(config).await
}
