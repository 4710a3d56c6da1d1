use std::path::PathBuf;

use clap::{Parser, Subcommand};
use entrygen::StageKind;

#[derive(Parser, Debug)]
#[command(
    name = "stagegen",
    author,
    version,
    about = "Generate Metal entry points that share one binding layout"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the shared header, one `.metal` file per unit and the dispatch table.
    Generate(GenerateArgs),
    /// Write only the shared header.
    Prelude(PreludeArgs),
    /// Print the entry points a unit exports and the slots they bind.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Generator configuration (`stagegen.toml`); built-in defaults apply when omitted.
    #[arg(long, value_name = "FILE", env = "STAGEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory receiving the generated files.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Name units without an `identity` after their directory instead of failing.
    #[arg(long)]
    pub identity_from_path: bool,

    /// Shader unit directories, each holding a `stage.toml`.
    #[arg(value_name = "UNIT_DIR", required = true)]
    pub units: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct PreludeArgs {
    /// Generator configuration (`stagegen.toml`); built-in defaults apply when omitted.
    #[arg(long, value_name = "FILE", env = "STAGEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Header file to write.
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Shader unit directory holding a `stage.toml`.
    #[arg(value_name = "UNIT_DIR")]
    pub unit: PathBuf,

    /// Generator configuration (`stagegen.toml`); built-in defaults apply when omitted.
    #[arg(long, value_name = "FILE", env = "STAGEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Name a unit without an `identity` after its directory instead of failing.
    #[arg(long)]
    pub identity_from_path: bool,

    /// Only list entries of this stage (`compute`, `vertex`, `fragment`, `filter`, `initialize`).
    #[arg(long, value_name = "STAGE", value_parser = parse_stage_kind)]
    pub stage: Option<StageKind>,

    /// Print full declarations instead of one line per entry.
    #[arg(long)]
    pub declarations: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_stage_kind(value: &str) -> Result<StageKind, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("stage must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "compute" | "kernel" => Ok(StageKind::Compute),
        "vertex" => Ok(StageKind::Vertex),
        "fragment" => Ok(StageKind::Fragment),
        "filter" => Ok(StageKind::Filter),
        "initialize" | "init" => Ok(StageKind::Initialize),
        _ => Err(format!(
            "unknown stage '{trimmed}' (expected compute, vertex, fragment, filter or initialize)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stage_aliases() {
        assert_eq!(parse_stage_kind("kernel").unwrap(), StageKind::Compute);
        assert_eq!(parse_stage_kind(" Fragment ").unwrap(), StageKind::Fragment);
        assert_eq!(parse_stage_kind("init").unwrap(), StageKind::Initialize);
        assert!(parse_stage_kind("").is_err());
        assert!(parse_stage_kind("geometry").is_err());
    }

    #[test]
    fn generate_requires_units() {
        assert!(Cli::try_parse_from(["stagegen", "generate", "--out", "build"]).is_err());
        let cli = Cli::try_parse_from([
            "stagegen",
            "generate",
            "--out",
            "build",
            "--identity-from-path",
            "units/plasma",
            "units/wave",
        ])
        .unwrap();
        match cli.command {
            Command::Generate(args) => {
                assert!(args.identity_from_path);
                assert_eq!(args.units.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
