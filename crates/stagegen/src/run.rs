use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use entrygen::{
    render_header, DispatchTable, GeneratedUnit, Generator, GeneratorConfig, LoadOptions,
    ShaderUnit,
};
use shaderabi::Slot;
use tracing_subscriber::EnvFilter;

use crate::cli::{GenerateArgs, InspectArgs, PreludeArgs};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let Some(path) = path else {
        tracing::debug!("no config supplied; using built-in defaults");
        return Ok(GeneratorConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = GeneratorConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    tracing::debug!(config = %path.display(), passes = config.passes.len(), "loaded config");
    Ok(config)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

/// Generates every unit before writing anything, so a failing unit leaves
/// the output directory as it was.
pub fn generate(args: GenerateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = config.registry()?;
    let generator = Generator::new(&registry);
    let options = LoadOptions {
        derive_identity: args.identity_from_path,
    };

    let mut table = DispatchTable::new(&registry);
    let mut generated: Vec<GeneratedUnit> = Vec::with_capacity(args.units.len());
    for dir in &args.units {
        let unit = ShaderUnit::load(dir, options)
            .with_context(|| format!("failed to load shader unit {}", dir.display()))?;
        let output = unit
            .generate(&generator, &config.header)
            .with_context(|| format!("failed to generate shader unit {}", dir.display()))?;
        table
            .push_unit(&output)
            .with_context(|| format!("shader unit {} clashes with an earlier unit", dir.display()))?;
        generated.push(output);
    }
    table
        .check_host_passes(&config.passes)
        .context("host passes do not match the generated entry points")?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    write_file(&args.out.join(&config.header), &render_header(&registry))?;
    for unit in &generated {
        write_file(&args.out.join(unit.file_name()), &unit.source)?;
    }
    let dispatch = table.to_json().context("failed to serialise dispatch table")?;
    write_file(&args.out.join(&config.dispatch), &dispatch)?;

    let entries: usize = generated.iter().map(|unit| unit.entries.len()).sum();
    tracing::info!(
        units = generated.len(),
        entries,
        out = %args.out.display(),
        "generation complete"
    );
    println!(
        "Generated {entries} entry points for {} shader(s) in {}",
        generated.len(),
        args.out.display()
    );
    Ok(())
}

pub fn prelude(args: PreludeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = config.registry()?;
    if let Some(parent) = args.out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    write_file(&args.out, &render_header(&registry))?;
    println!("Wrote {}", args.out.display());
    Ok(())
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = config.registry()?;
    let generator = Generator::new(&registry);
    let options = LoadOptions {
        derive_identity: args.identity_from_path,
    };
    let unit = ShaderUnit::load(&args.unit, options)
        .with_context(|| format!("failed to load shader unit {}", args.unit.display()))?;
    let output = unit
        .generate(&generator, &config.header)
        .with_context(|| format!("failed to generate shader unit {}", args.unit.display()))?;

    println!("Shader '{}' ({})", output.identity, unit.root().display());
    if let Some(description) = &unit.manifest().description {
        println!("  {description}");
    }
    for entry in &output.entries {
        if let Some(kind) = args.stage {
            if entry.stage.tag() != kind.tag() {
                continue;
            }
        }
        if args.declarations {
            println!("{}\n", entry.signature.render_declaration(&entry.name));
            continue;
        }
        let slots: Vec<String> = entry.signature.slots().iter().map(describe_slot).collect();
        println!(
            "  {:<36} {:<12} {}",
            entry.name,
            entry.stage.to_string(),
            slots.join(" ")
        );
    }
    Ok(())
}

fn describe_slot(slot: &Slot) -> String {
    if slot.len == 1 {
        format!("{}({})", slot.space, slot.index)
    } else {
        format!("{}({}..{})", slot.space, slot.index, slot.range().end)
    }
}
