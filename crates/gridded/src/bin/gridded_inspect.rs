//! Inspect the grid and variables of a netCDF dataset.
//!
//! Runs the same grid discovery the library uses and prints what was
//! found: grid kind, name, node shape, face count and the variables
//! defined on the grid.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gridded::{Dataset, GridFactory, GridTopology, HasNodes};

#[derive(Parser, Debug)]
#[command(name = "gridded-inspect")]
#[command(about = "Inspect UGRID/SGRID grids in netCDF files")]
struct Args {
    /// netCDF file path or OPeNDAP URL
    path: String,

    /// Grid type to use instead of detecting it (e.g. ugrid, sgrid, roms)
    #[arg(long)]
    grid_type: Option<String>,

    /// Topology mapping entry, repeatable (e.g. --topology faces=nv)
    #[arg(long = "topology", value_name = "KEY=VAR")]
    topology: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_topology(entries: &[String]) -> Result<Option<GridTopology>> {
    if entries.is_empty() {
        return Ok(None);
    }
    let mut topology = GridTopology::new();
    for entry in entries {
        let Some((key, var)) = entry.split_once('=') else {
            bail!("invalid topology entry '{}', expected KEY=VAR", entry);
        };
        topology.insert(key.trim(), var.trim());
    }
    Ok(Some(topology))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let mut factory = GridFactory::from_env().context("loading grid conventions")?;

    let mut dataset = Dataset::builder().source(
        gridded::open_dataset(&args.path).with_context(|| format!("opening {}", args.path))?,
    );
    if let Some(topology) = parse_topology(&args.topology)? {
        dataset = dataset.grid_topology(topology);
    }
    if let Some(grid_type) = &args.grid_type {
        dataset = dataset.grid_type(grid_type.as_str());
    }
    let dataset = dataset
        .build(&mut factory)
        .with_context(|| format!("loading grid from {}", args.path))?;

    let grid = dataset.grid();
    info!(path = %args.path, grid = grid.name(), "Inspected dataset");

    let faces = grid.faces().map(|f| f.nrows());
    if args.json {
        let variables: Vec<_> = dataset
            .variables()
            .values()
            .map(|v| {
                json!({
                    "name": v.name,
                    "dimensions": v.dimensions,
                    "shape": v.shape(),
                    "units": v.units(),
                })
            })
            .collect();
        let report = json!({
            "path": args.path,
            "kind": grid.kind().as_str(),
            "name": grid.name(),
            "mesh_name": grid.mesh_name(),
            "shape": grid.shape(),
            "faces": faces,
            "variables": variables,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", args.path);
    println!("  kind:      {}", grid.kind());
    println!("  name:      {}", grid.name());
    if let Some(mesh) = grid.mesh_name() {
        println!("  mesh:      {}", mesh);
    }
    println!("  shape:     {:?}", grid.shape());
    if let Some(n) = faces {
        println!("  faces:     {}", n);
    }
    println!("  variables: {}", dataset.variables().len());
    for var in dataset.variables().values() {
        let units = var.units().unwrap_or("-");
        println!("    {:<24} {:?} [{}]", var.name, var.shape(), units);
    }

    Ok(())
}
