use clap::{ArgAction, Parser, Subcommand};
use commands::{add, config, import, live, offline, render, search};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "teli")]
#[command(about = "Teli - search TMDB and keep your watchlist from the terminal")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search TMDB through the server
    Search {
        /// Title to look for
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Add one title to the watchlist
    Add {
        /// TMDB id of the title
        tmdb_id: String,

        /// movie or tv
        #[arg(long, value_name = "TYPE")]
        media_type: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        year: String,

        #[arg(long, default_value = "")]
        poster_path: String,

        #[arg(long, default_value = "")]
        overview: String,
    },
    /// Live search: type queries line by line, results appear once typing settles
    #[command(long_about = "Read query edits from stdin, one per line, and run them through the debounced search session. \
        Only the last edit in a quiet period is searched. ':add N' adds result N, ':close' ends the session and reports whether the page would reload.")]
    Live,
    /// Review a list of titles and add the chosen matches
    #[command(long_about = "Look up the best match for every line of FILE, confirm or change each match interactively, then add the checked rows.")]
    Import {
        /// File with one title per line
        file: PathBuf,

        /// Accept every best match without prompting
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Manage the offline asset cache
    Offline {
        #[command(subcommand)]
        cmd: OfflineCommands,
    },
    /// Render search results JSON into card markup
    Render {
        /// File holding a search response (`{"results": [...]}`)
        file: PathBuf,

        /// Render import-row "Select" controls instead of "Add"
        #[arg(long, action = ArgAction::SetTrue)]
        inline: bool,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum OfflineCommands {
    /// Precache every configured asset into the current cache version
    Install,
    /// Delete cache versions other than the current one
    Activate,
    /// Fetch a path network-first, falling back to the cache
    Fetch {
        /// Absolute path on the server, e.g. /static/style.css
        path: String,
    },
    /// List cache versions on disk
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let context = commands::Context::load(cli.config.as_deref())?;

    logging::init_logging(cli.verbose, cli.quiet, &context.config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Search { query } => search::run_search(&context, &query.join(" "), &output).await,
        Commands::Add {
            tmdb_id,
            media_type,
            title,
            year,
            poster_path,
            overview,
        } => {
            let request = add::build_request(&tmdb_id, &media_type, title, year, poster_path, overview)?;
            add::run_add(&context, request, &output).await
        }
        Commands::Live => live::run_live(&context, &output).await,
        Commands::Import { file, yes } => import::run_import(&context, &file, yes, &output).await,
        Commands::Offline { cmd } => offline::run_offline(&context, cmd, &output).await,
        Commands::Render { file, inline } => render::run_render(&context, &file, inline, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show);
            config::run_config(&context, cmd, &output)
        }
    }
}
