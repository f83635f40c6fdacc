use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use cnprice::cli::{OutputFormat, RunOptions};
use cnprice::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct PageArgs {
    /// Sales page URL or saved HTML file
    #[arg(short, long)]
    source: Option<String>,

    /// Currency to convert reference prices into
    #[arg(short = 'C', long)]
    currency: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Sort rows by percentage once all prices are in
    #[arg(long)]
    sort: bool,
}

impl From<PageArgs> for RunOptions {
    fn from(args: PageArgs) -> RunOptions {
        RunOptions {
            source: args.source,
            currency: args.currency,
            format: args.format,
            sort: args.sort,
        }
    }
}

impl From<Commands> for cnprice::AppCommand {
    fn from(cmd: Commands) -> cnprice::AppCommand {
        match cmd {
            Commands::Show(args) => cnprice::AppCommand::Show(args.into()),
            Commands::Watch(args) => cnprice::AppCommand::Watch(args.into()),
            Commands::Currencies => cnprice::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Annotate the sales page once and print it
    Show(PageArgs),
    /// Keep annotating the sales page as it changes
    Watch(PageArgs),
    /// List supported currencies and their rates
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cnprice::cli::setup::setup(),
        Some(cmd) => cnprice::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
