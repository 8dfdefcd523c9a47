use clap::{Parser, Subcommand};
use inbox_agent::{setup_logging, AppState, Config};
use log::{debug, info, LevelFilter};
use std::sync::Arc;

#[derive(Parser)]
#[clap(name = "Inbox Agent")]
#[clap(version = "0.1.0")]
#[clap(about = "HTTP service answering natural-language queries against a Gmail inbox", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Force use of stderr-only logging (no file logging)
    #[clap(long, short, action)]
    memory_only: bool,

    /// Override the bind address from configuration
    #[clap(long)]
    bind: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default if no command specified)
    #[clap(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_target = if cli.memory_only {
        env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .init();
        String::from("stderr-only")
    } else {
        setup_logging(LevelFilter::Debug, None)?
    };

    match cli.command {
        Some(Commands::Serve) | None => {}
    }

    info!("Inbox agent starting...");
    info!("Logs will be written to {}", log_target);

    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    debug!("Serving with model '{}'", config.model);

    let addr = config.bind_addr.clone();
    let state = AppState::new(Arc::new(config));
    let app = inbox_agent::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
