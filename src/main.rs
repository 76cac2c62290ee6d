use std::path::PathBuf;

use clap::{Parser, Subcommand};
use course_progress::ProgressService;
use course_progress::config::Config;
use course_progress::progress::model::sections_from_json;
use course_progress::store::sqlite::SqliteProgressStore;
use course_progress::utils::init_log;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "./progress.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the progress schema
    Init,
    /// Print a stored progress record as JSON
    Show {
        #[arg(long)]
        user: String,
        #[arg(long)]
        course: String,
    },
    /// Apply a partial sections payload from a JSON file and print the
    /// merged record
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        course: String,
        /// Path to the payload file
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::load_or_default(&args.config)?;
    let _guard = init_log(config.log_path.clone());

    let store = SqliteProgressStore::connect(&config.database_url()).await?;
    let service =
        ProgressService::new(store).with_max_attempts(config.update_attempts);

    match args.command {
        Command::Init => {
            // connect already ran the schema setup
            println!("progress store ready at {}", config.database_url());
        }
        Command::Show { user, course } => {
            let record = service.fetch_progress(&user, &course).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Update { user, course, payload } => {
            let payload = std::fs::read_to_string(payload)?;
            let incoming = sections_from_json(&payload)?;
            let record = service.update_progress(&user, &course, &incoming).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }
    Ok(())
}
