//! Functionality related to the `scqc run` command itself.

use std::path::PathBuf;

use anyhow::Context;
use clap::builder::RangedU64ValueParser;
use clap::Args;
use tracing::debug;
use tracing::info;

use crate::discovery::LogFiles;
use crate::modules::get_all_modules;
use crate::modules::ModuleContext;
use crate::modules::ModuleOutcome;
use crate::rank::KneeParams;
use crate::rank::DEFAULT_KNEE_DIVISOR;
use crate::rank::DEFAULT_KNEE_OFFSET;
use crate::registry::IgnoreList;
use crate::render::write_report;

//========================//
// Command line arguments //
//========================//

/// Clap arguments for the `scqc run` subcommand.
#[derive(Args)]
pub struct RunArgs {
    /// Files or directories to search for reports.
    #[arg(value_name = "PATH", required = true)]
    src: Vec<PathBuf>,

    /// Directory to output files to. Defaults to current working directory.
    #[arg(short = 'o', long, value_name = "PATH")]
    output_directory: Option<PathBuf>,

    /// Ignore samples whose name matches this glob (`*` and `?` wildcards).
    /// May be given more than once.
    #[arg(short = 'x', long = "ignore-samples", value_name = "GLOB")]
    ignore_samples: Vec<String>,

    /// Only run one module (specify the anchor of the module).
    #[arg(long = "only", value_name = "MODULE")]
    only_module: Option<String>,

    /// 1-based barcode rank whose count is used to locate the knee of barcode
    /// rank curves.
    #[arg(
        long,
        value_name = "USIZE",
        default_value_t = DEFAULT_KNEE_OFFSET,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..),
    )]
    knee_offset: usize,

    /// Divisor applied to the count at the knee offset to get the cell
    /// threshold.
    #[arg(
        long,
        value_name = "U64",
        default_value_t = DEFAULT_KNEE_DIVISOR,
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    knee_divisor: u64,
}

//==============//
// Main command //
//==============//

/// Main method for the `scqc run` subcommand.
pub fn run(args: RunArgs) -> anyhow::Result<()> {
    info!("Starting run command...");
    debug!("Arguments:");

    //=========//
    // Sources //
    //=========//

    for src in &args.src {
        debug!("  [*] Source: {}", src.display());
    }

    //==================//
    // Output Directory //
    //==================//

    let output_directory = match args.output_directory {
        Some(p) => p,
        None => std::env::current_dir()?,
    };
    debug!("  [*] Output directory: {}", output_directory.display());

    //================//
    // Ignore Samples //
    //================//

    let ignore = IgnoreList::new(&args.ignore_samples)
        .with_context(|| format!("invalid ignore glob in: {:?}", args.ignore_samples))?;
    debug!("  [*] Ignore samples: {:?}", args.ignore_samples);

    //=============//
    // Only Module //
    //=============//

    debug!("  [*] Only module: {:?}", args.only_module);
    let modules = get_all_modules(args.only_module)?;

    //=============//
    // Knee Params //
    //=============//

    let knee = KneeParams::new(args.knee_offset, args.knee_divisor);
    debug!(
        "  [*] Knee offset: {}, divisor: {}",
        knee.offset, knee.divisor
    );

    //===========//
    // Discovery //
    //===========//

    let files = LogFiles::scan(&args.src)?;
    info!("Searching {} files for reports.", files.len());

    //=========//
    // Modules //
    //=========//

    let context = ModuleContext::new(&files, &ignore, knee);
    let mut reports = Vec::new();

    for module in modules {
        info!("Running the {} module.", module.name());

        match module.run(&context)? {
            ModuleOutcome::Report(report) => reports.push(report),
            ModuleOutcome::NoSamplesFound => {
                info!("  [*] No samples found for the {} module.", module.name())
            }
        }
    }

    if reports.is_empty() {
        info!("No reports were found for any module.");
        return Ok(());
    }

    //========//
    // Output //
    //========//

    write_report(&reports, &output_directory)?;
    info!("Done.");

    Ok(())
}
