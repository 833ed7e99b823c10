//! Catalogue extraction from the host game's JavaScript sources
//!
//! Scans for the constructors the game uses to declare its content:
//! buildings (`new Game.Object(...)`), synergy upgrades
//! (`Game.SynergyUpgrade(...)`) and grandma synergies
//! (`Game.GrandmaSynergy(...)`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use rusqlite::Connection;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{BuildingDef, GrandmaSynergyDef, SynergyUpgradeDef};
use crate::sample;

/// A single- or double-quoted JS string literal; two capture groups.
const QUOTED: &str = r#"(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")"#;

/// Content declared by one source file, before ordinals are assigned
#[derive(Debug, Default, PartialEq)]
struct ExtractedContent {
    buildings: Vec<(String, Option<String>)>, // (name, plural)
    synergy_upgrades: Vec<SynergyUpgradeDef>,
    grandma_synergies: Vec<GrandmaSynergyDef>,
}

impl ExtractedContent {
    fn is_empty(&self) -> bool {
        self.buildings.is_empty()
            && self.synergy_upgrades.is_empty()
            && self.grandma_synergies.is_empty()
    }
}

struct Patterns {
    building: Regex,
    synergy: Regex,
    grandma: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            // new Game.Object('Farm','farm|farms|harvested|...', ...
            building: Regex::new(&format!(r"new\s+Game\.Object\s*\(\s*{QUOTED}\s*,\s*{QUOTED}"))?,
            // Game.SynergyUpgrade('Future almanacs','desc','Farm','Time machine', ...
            synergy: Regex::new(&format!(
                r"Game\.SynergyUpgrade\s*\(\s*{QUOTED}\s*,\s*{QUOTED}\s*,\s*{QUOTED}\s*,\s*{QUOTED}"
            ))?,
            // Game.GrandmaSynergy('Farmer grandmas','desc','Farm')
            grandma: Regex::new(&format!(
                r"Game\.GrandmaSynergy\s*\(\s*{QUOTED}\s*,\s*{QUOTED}\s*,\s*{QUOTED}"
            ))?,
        })
    }
}

/// Text of the `n`th quoted argument (0-based) of a match.
fn arg(caps: &Captures, n: usize) -> String {
    let raw = caps
        .get(1 + n * 2)
        .or_else(|| caps.get(2 + n * 2))
        .map_or("", |m| m.as_str());
    unescape(raw)
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_source(patterns: &Patterns, content: &str) -> ExtractedContent {
    let mut extracted = ExtractedContent::default();

    for caps in patterns.building.captures_iter(content) {
        let name = arg(&caps, 0);
        // Second argument is "singular|plural|verb|..."
        let plural = arg(&caps, 1)
            .split('|')
            .nth(1)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        extracted.buildings.push((name, plural));
    }

    for caps in patterns.synergy.captures_iter(content) {
        extracted.synergy_upgrades.push(SynergyUpgradeDef {
            name: arg(&caps, 0),
            primary_building: arg(&caps, 2),
            secondary_building: arg(&caps, 3),
        });
    }

    for caps in patterns.grandma.captures_iter(content) {
        extracted.grandma_synergies.push(GrandmaSynergyDef {
            name: arg(&caps, 0),
            building: arg(&caps, 2),
        });
    }

    extracted
}

/// Find all JavaScript files under `source_dir`, in a stable order
pub fn find_source_files(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(source_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "js") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Extract the catalogue from game sources and populate the database.
///
/// Building ordinals follow declaration order across all scanned files.
pub fn extract_to_database(conn: &Connection, source_dir: &Path) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();
    let patterns = Patterns::new()?;

    info!(dir = %source_dir.display(), "scanning for game content");
    let files = find_source_files(source_dir)?;
    info!(count = files.len(), "found javascript sources");

    let mut next_id: u32 = 0;
    for filepath in &files {
        let content = match fs::read_to_string(filepath)
            .with_context(|| format!("Failed to read {}", filepath.display()))
        {
            Ok(content) => content,
            Err(e) => {
                warn!("{:#}", e);
                stats.errors += 1;
                continue;
            }
        };

        let extracted = parse_source(&patterns, &content);
        if extracted.is_empty() {
            debug!(file = %filepath.display(), "no content declarations");
            stats.skipped += 1;
            continue;
        }

        for (name, plural) in extracted.buildings {
            db::upsert_building(
                conn,
                &BuildingDef {
                    id: next_id,
                    name: name.clone(),
                    plural,
                },
            )?;
            info!(id = next_id, %name, "building");
            next_id += 1;
            stats.buildings += 1;
        }

        for upgrade in &extracted.synergy_upgrades {
            db::upsert_synergy_upgrade(conn, upgrade)?;
            stats.synergy_upgrades += 1;
        }

        for upgrade in &extracted.grandma_synergies {
            db::upsert_grandma_synergy(conn, upgrade)?;
            stats.grandma_synergies += 1;
        }

        stats.files += 1;
    }

    // Not declared through a constructor we can recognise
    for link in sample::legacy_links() {
        db::upsert_legacy_link(conn, &link)?;
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ExtractStats {
    pub files: usize,
    pub buildings: usize,
    pub synergy_upgrades: usize,
    pub grandma_synergies: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Extracted {} buildings, {} synergy upgrades, {} grandma synergies from {} files. Skipped: {}, Errors: {}",
            self.buildings,
            self.synergy_upgrades,
            self.grandma_synergies,
            self.files,
            self.skipped,
            self.errors
        )
    }
}
