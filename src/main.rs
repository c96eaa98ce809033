use std::path::Path;
use std::str::FromStr;

use dotenv::dotenv;
use tracing::Level;

use postsign::config::ConfigLoader;

const CONFIG_FILE: &str = "./config.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    if std::env::args().any(|arg| arg == "--help" || arg == "-h") {
        ConfigLoader::print_help();
        return Ok(());
    }

    let config = if Path::new(CONFIG_FILE).exists() {
        ConfigLoader::from_file(CONFIG_FILE)?
    } else {
        ConfigLoader::load()?
    };
    ConfigLoader::validate(&config)?;

    tracing_subscriber::fmt()
        .with_max_level(Level::from_str(&config.log_level)?)
        .with_level(true)
        .with_thread_names(true)
        .with_target(true)
        .init();

    postsign::postsign::run(config).await
}
