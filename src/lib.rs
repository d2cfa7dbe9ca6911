pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod resolve;
pub mod session;
pub mod sync;

use cli::output::print_error;
use config::{OutputMode, RuntimeConfig};
use error::AppError;
use session::SessionFile;
use tracing_subscriber::filter::LevelFilter;

pub async fn run(cli_args: cli::Cli) -> i32 {
    init_logging(cli_args.verbose);

    let session_file = match cli_args.session_file.clone() {
        Some(path) => path,
        None => match SessionFile::default_path() {
            Ok(path) => path,
            Err(err) => {
                print_error(&err);
                return err.exit_code();
            }
        },
    };

    let config = RuntimeConfig {
        output_mode: if cli_args.table {
            OutputMode::Table
        } else {
            OutputMode::Json
        },
        session_file,
    };

    let result = dispatch(cli_args.command, &config).await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            print_error(&err);
            err.exit_code()
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    // Already set when embedded or under test.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn dispatch(command: cli::Commands, config: &RuntimeConfig) -> Result<(), AppError> {
    match command {
        cli::Commands::Connect(args) => cli::session::handle_connect(&args, config).await,
        cli::Commands::Disconnect => cli::session::handle_disconnect(config).await,
        cli::Commands::Status => cli::session::handle_status(config).await,
        cli::Commands::Rooms => cli::rooms::handle(config).await,
        cli::Commands::Dashboard => cli::dashboard::handle(config).await,
        cli::Commands::On { room } => cli::toggle::handle_room(&room, true, config).await,
        cli::Commands::Off { room } => cli::toggle::handle_room(&room, false, config).await,
        cli::Commands::All { state } => cli::toggle::handle_all(state, config).await,
        cli::Commands::Watch(args) => cli::watch::handle(&args, config).await,
    }
}
