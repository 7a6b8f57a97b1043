//! Command-line arguments and their handlers.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use strata_common::TilePos;
use strata_world::{
    save_preview, BlockRegistry, EditAction, Layer, NullObserver, SaveFormat, SaveManager, World,
    WorldConfig,
};
use tracing::{info, warn};

/// Strata world tool.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Generate, inspect and edit Strata worlds")]
pub struct Cli {
    /// Save directory
    #[arg(short, long, default_value = "saves")]
    pub dir: PathBuf,

    /// Block table (TOML); the built-in table when omitted
    #[arg(long)]
    pub blocks: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a new world and save it
    Generate {
        /// Save name
        name: String,
        /// World config (TOML); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seed; overrides the config, picked from the clock when neither sets one
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(..=MAX_SEED))]
        seed: Option<u64>,
        /// World width in cells
        #[arg(short = 'W', long)]
        width: Option<u32>,
        /// World height in cells
        #[arg(short = 'H', long)]
        height: Option<u32>,
        /// Save encoding
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
        /// Also write a preview PNG here
        #[arg(short, long)]
        preview: Option<PathBuf>,
    },
    /// Print a summary of a save
    Inspect {
        /// Save name
        name: String,
        /// Save encoding
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
    },
    /// Render a save as a PNG
    Preview {
        /// Save name
        name: String,
        /// Output image
        #[arg(short, long, default_value = "out.png")]
        out: PathBuf,
        /// Save encoding
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
    },
    /// Place or destroy a block in a save
    Edit {
        /// Save name
        name: String,
        /// Save encoding
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
        /// Edit to apply
        #[command(subcommand)]
        action: EditArg,
    },
    /// List saves
    List,
}

/// Edit subcommands.
#[derive(Subcommand, Debug)]
pub enum EditArg {
    /// Place a block
    Place {
        /// Column
        x: i32,
        /// Row (0 is the bottom)
        y: i32,
        /// Block name
        block: String,
    },
    /// Destroy the block at a position
    Destroy {
        /// Column
        x: i32,
        /// Row (0 is the bottom)
        y: i32,
    },
}

impl EditArg {
    fn into_edit(self) -> (TilePos, EditAction) {
        match self {
            Self::Place { x, y, block } => (TilePos::new(x, y), EditAction::Place { block }),
            Self::Destroy { x, y } => (TilePos::new(x, y), EditAction::Destroy),
        }
    }
}

/// Save encoding on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// Line-based text
    Text,
    /// Compressed binary snapshot
    Binary,
}

impl From<FormatArg> for SaveFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Binary => Self::Binary,
        }
    }
}

/// Runs a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let registry = load_registry(cli.blocks.as_deref())?;
    let manager = SaveManager::new(&cli.dir);

    match cli.command {
        Command::Generate {
            name,
            config,
            seed,
            width,
            height,
            format,
            preview,
        } => {
            let mut config = config.map(WorldConfig::load_from).unwrap_or_default();
            if width.is_some() || height.is_some() {
                let width = width.unwrap_or(config.size.width);
                let height = height.unwrap_or(config.size.height);
                config.resize(width, height);
            }
            config.validate();
            let seed = seed.or(config.seed).unwrap_or_else(clock_seed);
            config.seed = Some(seed);

            let world = World::generate(config.clone(), registry, seed, &mut NullObserver)
                .context("world generation failed")?;
            manager
                .save(&world, &name, format.into())
                .with_context(|| format!("failed to save {name}"))?;
            config
                .save_to(config_path(&manager, &name))
                .with_context(|| format!("failed to save config for {name}"))?;
            if let Some(path) = preview {
                save_preview(&world, &path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            info!("Generated {name} with seed {seed}");
        },
        Command::Inspect { name, format } => {
            let world = load_world(&manager, registry, &name, format.into())?;
            inspect(&world);
        },
        Command::Preview { name, out, format } => {
            let world = load_world(&manager, registry, &name, format.into())?;
            save_preview(&world, &out)
                .with_context(|| format!("failed to write {}", out.display()))?;
        },
        Command::Edit {
            name,
            format,
            action,
        } => {
            let mut world = load_world(&manager, registry, &name, format.into())?;
            let (pos, edit) = action.into_edit();
            let changed = world
                .apply_edit(pos, &edit, &mut NullObserver)
                .with_context(|| format!("edit at ({}, {}) failed", pos.x, pos.y))?;
            if changed {
                manager
                    .save(&world, &name, format.into())
                    .with_context(|| format!("failed to save {name}"))?;
                info!("Applied {edit:?} at ({}, {})", pos.x, pos.y);
            } else {
                warn!("Nothing to do at ({}, {})", pos.x, pos.y);
            }
        },
        Command::List => {
            for entry in manager.list().context("failed to list saves")? {
                println!("{} ({:?})", entry.name, entry.format);
            }
        },
    }
    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<BlockRegistry> {
    match path {
        Some(path) => BlockRegistry::load_from(path)
            .with_context(|| format!("failed to load blocks from {}", path.display())),
        None => BlockRegistry::builtin().context("built-in block table is invalid"),
    }
}

fn config_path(manager: &SaveManager, name: &str) -> PathBuf {
    manager.save_dir().join(format!("{name}.toml"))
}

/// Opens a save together with the config it was generated with.
fn load_world(
    manager: &SaveManager,
    registry: BlockRegistry,
    name: &str,
    format: SaveFormat,
) -> Result<World> {
    if !manager.exists(name, format) {
        bail!("no {format:?} save named {name} in {}", manager.save_dir().display());
    }
    let mut config = WorldConfig::load_from(config_path(manager, name));
    config.validate();
    let mut world = World::new(config, registry).context("block table is incomplete")?;
    manager
        .load(&mut world, name, format)
        .with_context(|| format!("failed to load {name}"))?;
    Ok(world)
}

fn inspect(world: &World) {
    let grid = world.grid();
    let heights = grid.height_map();
    let lowest = heights.iter().min().copied().unwrap_or_default();
    let highest = heights.iter().max().copied().unwrap_or_default();

    println!("size:    {}x{}", world.width(), world.height());
    println!("seed:    {}", world.config().seed.map_or("unknown".to_string(), |s| s.to_string()));
    println!("surface: {lowest}..={highest}");
    match world.spawn_point() {
        Ok(spawn) if world.grid().contains_pos(spawn) => {
            println!("spawn:   ({}, {})", spawn.x, spawn.y);
        },
        _ => println!("spawn:   above the top of the world"),
    }

    for layer in Layer::ALL {
        let mut counts: Vec<(String, usize)> = world
            .registry()
            .iter()
            .filter(|def| def.id != 0)
            .map(|def| {
                let n = grid
                    .cells()
                    .iter()
                    .filter(|cell| cell.slot(layer).block == def.block_id())
                    .count();
                (def.name.clone(), n)
            })
            .filter(|(_, n)| *n > 0)
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let summary: Vec<String> = counts.iter().map(|(name, n)| format!("{name}={n}")).collect();
        println!("{layer:?}: {}", summary.join(" "));
    }
}

/// Largest seed a TOML config can store.
const MAX_SEED: u64 = i64::MAX as u64;

/// Clock-derived seed, kept within TOML's integer range.
fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    (nanos as u64) & MAX_SEED
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("strata").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_parse_edit() {
        let parsed = cli(&["--dir", "x", "edit", "home", "place", "3", "4", "torch"]);
        match parsed.command {
            Command::Edit { name, action, .. } => {
                assert_eq!(name, "home");
                let (pos, edit) = action.into_edit();
                assert_eq!(pos, TilePos::new(3, 4));
                assert_eq!(edit, EditAction::place("torch"));
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_clock_seed_fits_toml() {
        assert!(clock_seed() <= MAX_SEED);
    }

    #[test]
    fn test_seed_outside_toml_range_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let dir_arg = dir.path().to_str().expect("utf-8 path");
        let too_big = (MAX_SEED + 1).to_string();
        let args = ["strata", "--dir", dir_arg, "generate", "big", "--seed", too_big.as_str()];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(!dir.path().join("big.world").exists());

        let max = MAX_SEED.to_string();
        let parsed = cli(&["generate", "big", "--seed", max.as_str()]);
        match parsed.command {
            Command::Generate { seed, .. } => assert_eq!(seed, Some(MAX_SEED)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_generate_edit_inspect() {
        let dir = TempDir::new().expect("temp dir");
        let dir_arg = dir.path().to_str().expect("utf-8 path");

        run(cli(&[
            "--dir", dir_arg, "generate", "demo", "-W", "128", "-H", "128", "--seed", "7",
        ]))
        .expect("generate");
        assert!(dir.path().join("demo.world").is_file());
        assert!(dir.path().join("demo.toml").is_file());

        run(cli(&["--dir", dir_arg, "edit", "demo", "destroy", "5", "2"])).expect("edit");
        run(cli(&["--dir", dir_arg, "inspect", "demo"])).expect("inspect");

        let png = dir.path().join("demo.png");
        run(cli(&[
            "--dir",
            dir_arg,
            "preview",
            "demo",
            "--out",
            png.to_str().expect("utf-8 path"),
        ]))
        .expect("preview");
        assert!(png.is_file());

        assert!(run(cli(&["--dir", dir_arg, "inspect", "missing"])).is_err());
    }
}
