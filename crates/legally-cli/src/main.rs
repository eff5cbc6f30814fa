use legally_cli::{cli, logging, App, AppConfig};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli::command().get_matches();
    logging::init(matches.get_flag("log-json"));

    let config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    tracing::debug!(version = legally_cli::VERSION, api_url = %config.client.api_url, "starting");

    let app = App::new(config);
    let mut stdout = std::io::stdout().lock();
    app.run(&matches, &mut stdout).await
}
