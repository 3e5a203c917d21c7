use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "strata", about = "Inspect layered configuration")]
pub struct Cli {
    /// Directory searched for configuration files; repeatable. Defaults to the
    /// current directory.
    #[arg(long = "root")]
    pub roots: Vec<PathBuf>,

    /// System property, as key=value; repeatable.
    #[arg(long = "define", short = 'D', value_parser = parse_define)]
    pub defines: Vec<(String, String)>,

    /// Active profile; repeatable, the last one wins.
    #[arg(long = "profile")]
    pub profiles: Vec<String>,

    #[arg(long, default_value = "warn", env = "STRATA_LOG")]
    pub log_level: String,

    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Effective value of a key, or the lookup failure.
    Key { name: String },
    /// Value as the highest-ordinal source holds it, before expansion.
    Raw { name: String },
    /// All known property names.
    Keys,
    /// Sources in precedence order.
    Sources,
    /// Effective value together with its origin.
    Describe { name: String },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
