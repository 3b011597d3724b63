use anyhow::Result;
use clap::Parser;
use tracing::error;

use slotbook_client::app::App;
use slotbook_client::cli::{self, Cli};
use slotbook_client::config::ClientConfig;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    slotbook_core::tracing::init_tracing();

    let cli = Cli::parse();
    match try_main(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!(error = %format!("{e:#}"), "fatal error");
            eprintln!("Something went wrong");
            eprintln!("{e:#}");
            eprintln!("Reload: run the command again.");
            std::process::exit(2);
        }
    }
}

/// Returns whether the command succeeded.
async fn try_main(cli: Cli) -> Result<bool> {
    let config = ClientConfig::from_env()?;
    let app = App::new(config)?;
    app.start().await?;

    let notice = cli::run(&app, cli.command).await;
    if notice.is_error() {
        eprintln!("{notice}");
    } else {
        println!("{notice}");
    }
    Ok(!notice.is_error())
}
