use clap::CommandFactory;
use clap::FromArgMatches;
use clap::Parser;
use clap::Subcommand;
use git_testament::git_testament;
use git_testament::render_testament;

use scqc::list;
use scqc::run;

git_testament!(TESTAMENT);

#[derive(Parser)]
#[command(name = "scqc", propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    subcommand: Subcommands,

    /// Only errors are printed to the stderr stream.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// All available information, including debug information, is printed to
    /// stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Subcommands {
    /// Finds single-cell QC reports and renders their results.
    Run(run::command::RunArgs),

    /// Lists the supported modules and report categories.
    List(list::command::ListArgs),
}

fn main() -> anyhow::Result<()> {
    let version = render_testament!(TESTAMENT);
    let matches = Cli::command().version(version).get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let mut level = tracing::Level::INFO;
    if cli.quiet {
        level = tracing::Level::ERROR;
    } else if cli.verbose {
        level = tracing::Level::DEBUG;
    }

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.subcommand {
        Subcommands::Run(args) => run::command::run(args),
        Subcommands::List(args) => list::command::list(args),
    }
}
