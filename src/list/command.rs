//! Functionality related to the `scqc list` command itself.

use anyhow::bail;
use clap::builder::PossibleValuesParser;
use clap::Args;
use prettytable::row;
use prettytable::Table;

use crate::modules::get_all_modules;

//========================//
// Command-line arguments //
//========================//

/// Command line arguments for `scqc list`.
#[derive(Args)]
pub struct ListArgs {
    /// The subject which you want to list values for.
    #[arg(value_parser = PossibleValuesParser::new(["modules", "categories"]))]
    subject: String,
}

//==============//
// Main command //
//==============//

/// Main method for the `scqc list` subcommand.
pub fn list(args: ListArgs) -> anyhow::Result<()> {
    let modules = get_all_modules(None)?;

    let table = match args.subject.as_str() {
        "modules" => {
            let mut table = Table::new();
            table.add_row(row!["Anchor", "Name", "Description"]);

            for module in &modules {
                table.add_row(row![module.anchor(), module.name(), module.info()]);
            }

            table
        }
        "categories" => {
            let mut table = Table::new();
            table.add_row(row!["Category", "Pattern", "Module"]);

            for module in &modules {
                for category in module.categories() {
                    table.add_row(row![category.name, category.pattern, module.anchor()]);
                }
            }

            table
        }
        s => bail!("Unsupported subject: {}", s),
    };

    table.printstd();

    Ok(())
}
