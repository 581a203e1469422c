use crate::analyzer::catalog::CATALOG;
use crate::analyzer::formatter::{OutputFormat, json, plain};
use crate::error::Result;
use std::io::IsTerminal;

/// Print the check catalog.
pub fn handle_checks(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let color = std::io::stdout().is_terminal();
            print!("{}", plain::format_catalog(CATALOG, color));
        }
        OutputFormat::Json => println!("{}", json::format_value(CATALOG)?),
    }
    Ok(())
}
