use crate::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Gen,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Gen(GenArgs),
    Init(InitArgs),
}

#[derive(Debug, Clone, Default)]
pub struct GenArgs {
    /// `None` reads `sqlgen.toml` when present and falls back to defaults.
    pub config: Option<PathBuf>,
    pub package: Option<String>,
    pub file: Option<PathBuf>,
    pub dry_run: bool,
    pub check: bool,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(|s| s.as_str()).peekable();
    match it.peek().copied() {
        None => Ok(Command::Gen(GenArgs::default())),
        Some("-h" | "--help") => Ok(Command::Help(HelpTopic::Root)),
        Some("gen") => {
            it.next();
            parse_gen(it)
        }
        Some("init") => {
            it.next();
            parse_init(it)
        }
        // `sqlgen --package db ...` is `sqlgen gen --package db ...`
        Some(flag) if flag.starts_with('-') => parse_gen(it),
        Some(other) => anyhow::bail!("unknown command: {other}"),
    }
}

fn parse_gen<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut args = GenArgs::default();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Gen)),
            "--config" => args.config = Some(PathBuf::from(value(&mut it, token)?)),
            _ if token.starts_with("--config=") => {
                args.config = Some(PathBuf::from(token.trim_start_matches("--config=")));
            }
            "--package" => args.package = Some(value(&mut it, token)?.to_string()),
            _ if token.starts_with("--package=") => {
                args.package = Some(token.trim_start_matches("--package=").to_string());
            }
            "--file" => args.file = Some(PathBuf::from(value(&mut it, token)?)),
            _ if token.starts_with("--file=") => {
                args.file = Some(PathBuf::from(token.trim_start_matches("--file=")));
            }
            "--dry-run" => args.dry_run = true,
            "--check" => args.check = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    if args.dry_run && args.check {
        anyhow::bail!("--dry-run and --check cannot be combined");
    }
    Ok(Command::Gen(args))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_FILE);

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            "--config" => config = PathBuf::from(value(&mut it, token)?),
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Init(InitArgs { config }))
}

fn value<'a>(it: &mut impl Iterator<Item = &'a str>, flag: &str) -> anyhow::Result<&'a str> {
    match it.next() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => anyhow::bail!("{flag} requires a value"),
    }
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlgen - generate Postgres data-access functions from annotated Rust structs

USAGE:
  sqlgen [gen] [OPTIONS]
  sqlgen init [OPTIONS]

COMMANDS:
  gen           Generate code for one source file (default)
  init          Write a sqlgen.toml template

Run `sqlgen <command> --help` for more."
            );
        }
        HelpTopic::Gen => {
            println!(
                "\
USAGE:
  sqlgen gen [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: sqlgen.toml if present)
  --package <NAME>      Package name (default: $SQLGEN_PACKAGE)
  --file <FILE>         Source file to generate for (default: $SQLGEN_FILE)
  --dry-run             Print the file that would change
  --check               Exit non-zero if output would change
  -h, --help            Print help

ENVIRONMENT:
  SQLGEN_LOG            Log filter for diagnostics on stderr (default: warn)"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  sqlgen init [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: sqlgen.toml)
  -h, --help            Print help"
            );
        }
    }
}
