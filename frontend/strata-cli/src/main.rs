mod cli;

use std::path::PathBuf;

use serde_json::json;
use strata_core::{BootstrapContext, Config};
use tracing::debug;

fn main() {
    if let Err(error) = run() {
        eprintln!("strata failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> strata_core::Result<()> {
    let args = cli::Cli::parse_args();
    strata_core::logging::init_tracing(&args.log_level);

    let config = load(&args)?;
    debug!(sources = config.sources().len(), "configuration loaded");

    match &args.command {
        cli::Command::Key { name } => print_key(&config, name, args.json)?,
        cli::Command::Raw { name } => {
            let raw = config.get_raw_value(name);
            if args.json {
                println!("{}", serde_json::to_string(&json!({ "key": name, "raw": raw }))?);
            } else {
                println!("{}", raw.as_deref().unwrap_or("<absent>"));
            }
        }
        cli::Command::Keys => {
            if args.json {
                println!("{}", serde_json::to_string(config.property_names())?);
            } else {
                for name in config.property_names() {
                    println!("{name}");
                }
            }
        }
        cli::Command::Sources => {
            let sources: Vec<_> = config
                .sources()
                .iter()
                .map(|source| json!({ "name": source.name(), "ordinal": source.ordinal() }))
                .collect();
            if args.json {
                println!("{}", serde_json::to_string(&sources)?);
            } else {
                for source in config.sources() {
                    println!("{:>5}  {}", source.ordinal(), source.name());
                }
            }
        }
        cli::Command::Describe { name } => match config.get_config_value(name) {
            Ok(Some(value)) if args.json => println!("{}", serde_json::to_string_pretty(&value)?),
            Ok(Some(value)) => {
                println!("name:     {}", value.name());
                println!("value:    {}", value.value());
                println!("raw:      {}", value.raw_value());
                println!("source:   {}", value.source_name());
                println!("ordinal:  {}", value.source_ordinal());
            }
            Ok(None) => println!("<absent>"),
            Err(error) => println!("{error}"),
        },
    }

    Ok(())
}

fn load(args: &cli::Cli) -> strata_core::Result<Config> {
    let mut context = context_for(&args.roots)?;
    context = context.with_system_properties(args.defines.iter().cloned().collect());
    if !args.profiles.is_empty() {
        context = context.with_profiles(args.profiles.clone());
    }
    strata_core::build_standard(&context)
}

// the first root doubles as the working directory, where `.env` is read
fn context_for(roots: &[PathBuf]) -> strata_core::Result<BootstrapContext> {
    match roots.first() {
        Some(first) => Ok(BootstrapContext::new(first.clone()).with_roots(roots.to_vec())),
        None => BootstrapContext::from_process(),
    }
}

/// Lookup failures are printed as their description rather than failing the process.
fn print_key(config: &Config, name: &str, as_json: bool) -> strata_core::Result<()> {
    let result = config.get_value::<String>(name);
    if as_json {
        let body = match &result {
            Ok(value) => json!({ "key": name, "value": value }),
            Err(error) => json!({ "key": name, "error": error.to_string() }),
        };
        println!("{}", serde_json::to_string(&body)?);
        return Ok(());
    }

    match result {
        Ok(value) => println!("{value}"),
        Err(error) => println!("{error}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_roots_searches_the_current_directory() {
        let context = context_for(&[]).expect("current dir");
        let cwd = std::env::current_dir().expect("current dir");
        let search_path = context.search_path();
        assert_eq!(search_path.working_dir(), cwd.as_path());
        assert_eq!(search_path.roots(), [cwd]);
    }

    #[test]
    fn first_root_is_the_working_directory() {
        let roots = vec![PathBuf::from("demos/basic"), PathBuf::from("extra")];
        let search_path = context_for(&roots).expect("context").search_path();
        assert_eq!(search_path.working_dir(), roots[0].as_path());
        assert_eq!(search_path.roots(), roots.as_slice());
    }
}
