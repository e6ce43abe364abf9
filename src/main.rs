use anyhow::Result;
use clap::Parser;
use devhub::cli::{self, Cli};
use devhub::logging::{LogFormat, init_logging};
use devhub_cache::{CacheAccessor, CacheConfig};
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(LogFormat::from_env());

    let config = CacheConfig::from_env();
    let cache = CacheAccessor::from_config(&config);

    let mut out = std::io::stdout();
    cli::run(cli.command, &cache, &mut out).await
}
