//! bkpdir
//!
//! Resolves the layered bkpdir configuration and explains where each value
//! came from.

use anyhow::{Result, bail};
use bkpdir::cli::fields::FieldsArgs;
use bkpdir::cli::{Cli, Command};
use bkpdir::config::{ConfigLoader, FieldFilter};
use bkpdir::format::{OutputFormat, format_chain, format_fields, format_problems, format_values};
use bkpdir::logging::{self, LogTarget};
use clap::Parser;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), logging::level_for(cli.verbose))?;

    let cwd = std::env::current_dir()?;
    let paths = cli.config_paths(&cwd);
    debug!(search = ?paths.search, mode = %cli.mode(), "Loading configuration");
    let loader = ConfigLoader::load_with_mode(paths, cli.mode());

    if !loader.problems().is_empty() {
        eprint!("{}", format_problems(loader.problems()));
    }

    match cli.command {
        Command::Config { format } => run_config(&loader, format)?,
        Command::Get { path, format } => run_get(&loader, &path, format)?,
        Command::Fields(args) => run_fields(&loader, args)?,
        Command::Chain { format } => print!("{}", format_chain(loader.applied_files(), format)),
    }

    Ok(())
}

fn run_config(loader: &ConfigLoader, format: OutputFormat) -> Result<()> {
    let values = loader.sources()?;
    print!("{}", format_values(&values, format));
    Ok(())
}

fn run_get(loader: &ConfigLoader, path: &str, format: OutputFormat) -> Result<()> {
    let Some(field) = loader.field(path)? else {
        bail!("Unknown configuration field '{}'", path);
    };

    if field.is_record {
        let prefix = format!("{}.", field.dotted_path);
        let children: Vec<_> = loader
            .fields()?
            .into_iter()
            .filter(|f| f.dotted_path.starts_with(&prefix))
            .collect();
        print!("{}", format_fields(&children, format));
        return Ok(());
    }

    match loader.source_of(path)? {
        Some(value) => print!("{}", format_values(&[value], format)),
        None => print!("{}", format_fields(&[field], format)),
    }
    Ok(())
}

fn run_fields(loader: &ConfigLoader, args: FieldsArgs) -> Result<()> {
    let filter: FieldFilter = args.filter()?;
    let fields = loader.find_fields(&filter)?;
    print!("{}", format_fields(&fields, args.format));
    Ok(())
}
