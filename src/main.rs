//! Boss Mode
//!
//! CpS share and synergy analyzer for Cookie Clicker economies.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use boss_mode::format::NumberStyle;
use boss_mode::models::{Catalog, HostState};
use boss_mode::snapshot::{EconomySnapshot, PRIMARY_WEIGHT, SECONDARY_WEIGHT};
use boss_mode::status::{BuffClassifier, RunStatus};
use boss_mode::{analyzer, db, extract, sample};

/// Floor for the watch interval; the host recomputes CpS no faster than this.
const MIN_POLL_INTERVAL_MS: u64 = 200;

#[derive(Parser)]
#[command(name = "boss-mode")]
#[command(about = "CpS share and synergy analyzer for Cookie Clicker economies")]
struct Cli {
    /// Path to the SQLite catalogue
    #[arg(short, long, env = "BOSS_MODE_DB", default_value = "boss_mode.db")]
    database: PathBuf,

    /// Log filter, e.g. "info" or "boss_mode=debug"
    #[arg(long, env = "BOSS_MODE_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the catalogue from the game's JavaScript sources
    Extract {
        /// Directory holding the game sources
        source_dir: PathBuf,

        /// Clear existing catalogue before extraction
        #[arg(long)]
        clear: bool,
    },

    /// Attribute CpS for a state export
    Analyze {
        /// JSON state written by the in-game adapter
        state: PathBuf,

        /// List each building's synergy partners
        #[arg(short, long)]
        verbose: bool,

        /// Number style for rates and counts
        #[arg(short, long, value_enum, default_value = "suffix")]
        style: NumberStyle,
    },

    /// List store upgrades from a state export, cheapest first
    ListUpgrades {
        /// JSON state written by the in-game adapter
        state: PathBuf,

        /// Number style for prices
        #[arg(short, long, value_enum, default_value = "suffix")]
        style: NumberStyle,
    },

    /// Re-read a state export on an interval and re-print the report
    Watch {
        /// JSON state written by the in-game adapter
        state: PathBuf,

        /// Poll interval in milliseconds (minimum 200)
        #[arg(short, long, default_value = "1000")]
        interval_ms: u64,

        /// Stop after this many reports (at least 1)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        ticks: Option<u64>,

        /// Number style for rates and counts
        #[arg(short, long, value_enum, default_value = "suffix")]
        style: NumberStyle,
    },

    /// List all buildings in the catalogue
    ListBuildings,

    /// List all synergy upgrades in the catalogue
    ListSynergies,

    /// Show catalogue details for a building
    Building {
        /// Building name, e.g. "Farm"
        name: String,
    },

    /// Initialize empty catalogue with schema
    Init,

    /// Load the built-in vanilla catalogue
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Extract { source_dir, clear } => {
            if clear {
                println!("Clearing existing catalogue...");
                db::clear_catalog(&conn)?;
            }

            let stats = extract::extract_to_database(&conn, &source_dir)?;
            println!("{}", stats);
        }

        Commands::Analyze {
            state,
            verbose,
            style,
        } => {
            let catalog = load_catalog(&conn)?;
            let classifier = BuffClassifier::new()?;
            let state = load_state(&state)?;
            let snapshot = build_snapshot(&catalog, &state)?;
            let status = RunStatus::from_host(&state, &classifier, now_ms());

            println!("{}", status.render_header(style));
            println!("{}", analyzer::analyze(&snapshot).render(style, verbose));
            println!("{}", status.render_prices(style));
        }

        Commands::ListUpgrades { state, style } => {
            let classifier = BuffClassifier::new()?;
            let state = load_state(&state)?;
            let status = RunStatus::from_host(&state, &classifier, now_ms());
            print!("{}", status.render_upgrades(style));
        }

        Commands::Watch {
            state,
            interval_ms,
            ticks,
            style,
        } => {
            let catalog = load_catalog(&conn)?;
            let classifier = BuffClassifier::new()?;
            let interval = Duration::from_millis(interval_ms.max(MIN_POLL_INTERVAL_MS));
            let mut tick: u64 = 0;

            loop {
                tick += 1;
                // A half-written export should not end the session.
                let loaded = load_state(&state).and_then(|host| {
                    let snapshot = build_snapshot(&catalog, &host)?;
                    Ok((host, snapshot))
                });
                match loaded {
                    Ok((host, snapshot)) => {
                        let status = RunStatus::from_host(&host, &classifier, now_ms());
                        println!("--- tick {} ---", tick);
                        println!("{}", status.render_header(style));
                        println!("{}", analyzer::analyze(&snapshot).render(style, false));
                    }
                    Err(e) => warn!("tick {}: {:#}", tick, e),
                }

                if ticks.is_some_and(|limit| tick >= limit) {
                    break;
                }
                thread::sleep(interval);
            }
        }

        Commands::ListBuildings => {
            let buildings = db::list_buildings(&conn)?;
            if buildings.is_empty() {
                println!("No buildings in catalogue. Run 'extract' or 'load-sample' first.");
            } else {
                println!("{:>4} {:<24} {:<24}", "Id", "Building", "Plural");
                println!("{}", "-".repeat(54));
                for b in buildings {
                    println!(
                        "{:>4} {:<24} {:<24}",
                        b.id,
                        b.name,
                        b.plural.as_deref().unwrap_or("")
                    );
                }
            }
        }

        Commands::ListSynergies => {
            let catalog = db::load_catalog(&conn)?;
            if catalog.synergy_upgrades.is_empty() && catalog.grandma_synergies.is_empty() {
                println!("No synergies in catalogue. Run 'extract' or 'load-sample' first.");
            } else {
                println!("{:<28} {:<22} {:<22}", "Upgrade", "Primary", "Secondary");
                println!("{}", "-".repeat(74));
                for s in &catalog.synergy_upgrades {
                    println!(
                        "{:<28} {:<22} {:<22}",
                        s.name, s.primary_building, s.secondary_building
                    );
                }
                for g in &catalog.grandma_synergies {
                    println!("{:<28} {:<22} {:<22}", g.name, "Grandma", g.building);
                }
                for l in &catalog.legacy_links {
                    println!(
                        "{:<28} {:<22} {:<22}",
                        l.name, l.source_building, l.partner_building
                    );
                }
            }
        }

        Commands::Building { name } => {
            let catalog = db::load_catalog(&conn)?;
            if let Some(b) = catalog.building(&name) {
                println!("Building: {}", b.name);
                println!("  ID: {}", b.id);
                if let Some(plural) = &b.plural {
                    println!("  Plural: {}", plural);
                }

                let synergies: Vec<_> = catalog.synergies_touching(&b.name).collect();
                if !synergies.is_empty() {
                    println!("  Synergies:");
                    for s in synergies {
                        let (partner, weight) = if s.primary_building == b.name {
                            (&s.secondary_building, PRIMARY_WEIGHT)
                        } else {
                            (&s.primary_building, SECONDARY_WEIGHT)
                        };
                        println!(
                            "    {} -> boosts {} by {}% per {}",
                            s.name,
                            partner,
                            weight * 100.0,
                            b.name
                        );
                    }
                }

                for g in catalog.grandma_synergies.iter().filter(|g| g.building == b.name) {
                    println!("  Boosted by Grandmas via {}", g.name);
                }
                for l in catalog
                    .legacy_links
                    .iter()
                    .filter(|l| l.source_building == b.name || l.partner_building == b.name)
                {
                    println!(
                        "  {}: {} boosts {} (weight {})",
                        l.name, l.source_building, l.partner_building, l.weight
                    );
                }
            } else {
                println!("Building '{}' not found", name);
            }
        }

        Commands::Init => {
            println!("Catalogue initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let count = sample::load_sample_data(&conn)?;
            println!("Loaded {} sample buildings", count);
        }
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let catalog = db::load_catalog(conn)?;
    if catalog.buildings.is_empty() {
        warn!("catalogue is empty; synergies will not be attributed. Run 'extract' or 'load-sample' first.");
    }
    Ok(catalog)
}

fn load_state(path: &Path) -> Result<HostState> {
    HostState::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn build_snapshot(catalog: &Catalog, state: &HostState) -> Result<EconomySnapshot> {
    let snapshot = EconomySnapshot::from_host(catalog, state)?;
    if snapshot.total_rate <= 0.0 {
        warn!(total = snapshot.total_rate, "no production in state; every share reads 0");
    }
    Ok(snapshot)
}

/// Wall clock in epoch milliseconds, for exports that carry no run timer.
fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
