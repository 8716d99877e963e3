use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

use rdm::app::App;
use rdm::commands::Command;
use rdm::config::Config;
use rdm::error::AppError;
use rdm::logging;

#[derive(Parser, Debug)]
#[command(name = "rdm")]
#[command(about = "Send magnet links to Real-Debrid and manage your torrents")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rdm/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let guard = logging::init(&config.log, &config.data_dir()?)?;

  // Storage is opened once here and shared from the app context
  let app = App::new(config)?;
  let mut stdout = std::io::stdout();
  let result = app.run(args.command, &mut stdout).await;

  let report = match result {
    Ok(()) => return Ok(()),
    Err(report) => report,
  };

  // Typed errors get their user-facing message instead of a report
  if let Some(err) = report.downcast_ref::<AppError>() {
    tracing::error!(code = err.code(), error = %err, "command failed");
    eprintln!("error: {} [{}]", err.user_message(), err.code());
    if err.is_auth() {
      eprintln!("hint: run `rdm login <API_KEY>` with a key from https://real-debrid.com/apitoken");
    }
    drop(guard);
    std::process::exit(1);
  }

  Err(report)
}
