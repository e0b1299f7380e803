use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use siteforge::logging::{self, LogFormat};

mod cmd;

#[derive(Parser)]
#[command(name = "siteforge")]
#[command(version, about = "Natural-language website builder")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to siteforge.toml (defaults to ./siteforge.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the dashboard API server
    Serve {
        /// Port to serve on (overrides [server] port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable dev mode (CORS permissive, bind all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// Create, list, edit and watch sites through a running dashboard
    Sites(SitesArgs),
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Args, Clone)]
pub struct SitesArgs {
    /// Dashboard base URL
    #[arg(long, env = "SITEFORGE_SERVER", default_value = "http://127.0.0.1:3141")]
    pub server: String,

    /// User id sent to the dashboard
    #[arg(long, env = "SITEFORGE_USER")]
    pub user: String,

    #[command(subcommand)]
    pub command: SitesCommands,
}

#[derive(Subcommand, Clone)]
pub enum SitesCommands {
    /// List your sites
    List,
    /// Create a new site
    Create {
        /// Lowercase letters, digits and hyphens
        name: String,

        /// What the site should be; starts an initial AI build
        #[arg(short, long)]
        description: Option<String>,

        /// Open the site's URL once created
        #[arg(long)]
        open: bool,
    },
    /// Show repository and hosting details of a site
    Show { id: String },
    /// Request an AI edit of a site
    Edit {
        id: String,
        prompt: String,

        /// Keep watching the job until it finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Print the state of a site's latest edit job
    Status { id: String },
    /// Follow a site's edit jobs until interrupted
    Watch {
        id: String,

        /// Exit after the first job finishes
        #[arg(long)]
        once: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any problems
    Validate,
    /// Initialize a default siteforge.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real deployments set the environment directly
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format)?;

    match &cli.command {
        Commands::Serve { port, dev } => cmd::cmd_serve(cli.config.as_deref(), *port, *dev).await?,
        Commands::Sites(args) => cmd::cmd_sites(args).await?,
        Commands::Config { command } => cmd::cmd_config(cli.config.as_deref(), command.clone())?,
    }

    Ok(())
}
