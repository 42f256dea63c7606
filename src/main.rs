//! mongoq - shell-style MongoDB queries from the command line
//!
//! # Usage
//!
//! ```bash
//! mongoq preprocess 'db.users.find({age: {$gt: 21}})'
//! mongoq mongodb://localhost:27017/shop query 'db.orders.find({})' --page 1
//! mongoq -d staging indexes create users email --unique
//! ```

use tracing::Level;

use mongoq::cli::CliInterface;
use mongoq::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Parse arguments, load configuration, initialize logging and run the
/// selected subcommand
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.run().await
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // Logs go to stderr so query output can be piped
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
