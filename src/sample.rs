//! Built-in catalogue for the vanilla building set
//!
//! Lets the analyzer run without extracting from game sources.

use anyhow::Result;
use rusqlite::Connection;

use crate::db;
use crate::models::{
    BuildingDef, GrandmaSynergyDef, LegacyKind, LegacyLinkDef, SynergyUpgradeDef,
};

/// (name, plural) in host declaration order; the index is the building id.
const BUILDINGS: &[(&str, &str)] = &[
    ("Cursor", "cursors"),
    ("Grandma", "grandmas"),
    ("Farm", "farms"),
    ("Mine", "mines"),
    ("Factory", "factories"),
    ("Bank", "banks"),
    ("Temple", "temples"),
    ("Wizard tower", "wizard towers"),
    ("Shipment", "shipments"),
    ("Alchemy lab", "alchemy labs"),
    ("Portal", "portals"),
    ("Time machine", "time machines"),
    ("Antimatter condenser", "antimatter condensers"),
    ("Prism", "prisms"),
    ("Chancemaker", "chancemakers"),
    ("Fractal engine", "fractal engines"),
    ("Javascript console", "javascript consoles"),
    ("Idleverse", "idleverses"),
    ("Cortex baker", "cortex bakers"),
    ("You", "You"),
];

/// (upgrade, primary, secondary) in host declaration order.
///
/// Extracting from the game sources replaces this with whatever the
/// installed version declares.
const SYNERGY_UPGRADES: &[(&str, &str, &str)] = &[
    ("Future almanacs", "Farm", "Time machine"),
    ("Rain prayer", "Farm", "Temple"),
    ("Seismic magic", "Mine", "Wizard tower"),
    ("Asteroid mining", "Mine", "Shipment"),
    ("Quantum electronics", "Factory", "Antimatter condenser"),
    ("Temporal overclocking", "Factory", "Time machine"),
    ("Contracts from beyond", "Bank", "Portal"),
    ("Printing presses", "Factory", "Bank"),
    ("Paganism", "Temple", "Portal"),
    ("God particle", "Temple", "Antimatter condenser"),
    ("Arcane knowledge", "Wizard tower", "Alchemy lab"),
    ("Magical botany", "Farm", "Wizard tower"),
    ("Fossil fuels", "Mine", "Shipment"),
    ("Shipyards", "Factory", "Shipment"),
    ("Primordial ores", "Mine", "Alchemy lab"),
    ("Gold fund", "Bank", "Alchemy lab"),
    ("Infernal crops", "Farm", "Portal"),
    ("Abysmal glimmer", "Portal", "Prism"),
    ("Relativistic parsec-skipping", "Shipment", "Time machine"),
    ("Primeval glow", "Time machine", "Prism"),
    ("Extra physics funding", "Bank", "Antimatter condenser"),
    ("Chemical proficiency", "Alchemy lab", "Antimatter condenser"),
    ("Light magic", "Wizard tower", "Prism"),
    ("Mystical energies", "Temple", "Prism"),
    ("Gemmed talismans", "Mine", "Chancemaker"),
    ("Charm quarks", "Chancemaker", "Antimatter condenser"),
    ("Recursive mirrors", "Fractal engine", "Prism"),
    ("Mice clicking mice", "Fractal engine", "Cursor"),
    ("Script grannies", "Javascript console", "Grandma"),
    ("Tombola computing", "Javascript console", "Chancemaker"),
    ("Perforated mille-feuille cosmos", "Idleverse", "Portal"),
    ("Infraverses and superverses", "Idleverse", "Shipment"),
    ("Fertile minds", "Farm", "Cortex baker"),
    ("Cloning vats", "Cortex baker", "You"),
];

/// One per building from Farm on, in host declaration order.
const GRANDMA_SYNERGIES: &[(&str, &str)] = &[
    ("Farmer grandmas", "Farm"),
    ("Miner grandmas", "Mine"),
    ("Worker grandmas", "Factory"),
    ("Cosmic grandmas", "Shipment"),
    ("Transmuted grandmas", "Alchemy lab"),
    ("Altered grandmas", "Portal"),
    ("Grandmas' grandmas", "Time machine"),
    ("Antigrandmas", "Antimatter condenser"),
    ("Rainbow grandmas", "Prism"),
    ("Banker grandmas", "Bank"),
    ("Priestess grandmas", "Temple"),
    ("Witch grandmas", "Wizard tower"),
    ("Lucky grandmas", "Chancemaker"),
    ("Metagrandmas", "Fractal engine"),
    ("Binary grandmas", "Javascript console"),
    ("Alternate grandmas", "Idleverse"),
    ("Brainy grandmas", "Cortex baker"),
    ("Clone grandmas", "You"),
];

/// Relationships with hard-wired formulas: Elder Pact makes every Portal
/// boost every Grandma by a flat amount.
pub fn legacy_links() -> Vec<LegacyLinkDef> {
    vec![LegacyLinkDef {
        name: "Elder Pact".to_string(),
        kind: LegacyKind::FlatPerPartner,
        source_building: "Portal".to_string(),
        partner_building: "Grandma".to_string(),
        weight: 0.05,
    }]
}

/// Replace the catalogue with the built-in content
pub fn load_sample_data(conn: &Connection) -> Result<usize> {
    db::clear_catalog(conn)?;

    for (id, (name, plural)) in BUILDINGS.iter().enumerate() {
        db::upsert_building(
            conn,
            &BuildingDef {
                id: id as u32,
                name: name.to_string(),
                plural: Some(plural.to_string()),
            },
        )?;
    }

    for (name, primary, secondary) in SYNERGY_UPGRADES {
        db::upsert_synergy_upgrade(
            conn,
            &SynergyUpgradeDef {
                name: name.to_string(),
                primary_building: primary.to_string(),
                secondary_building: secondary.to_string(),
            },
        )?;
    }

    for (name, building) in GRANDMA_SYNERGIES {
        db::upsert_grandma_synergy(
            conn,
            &GrandmaSynergyDef {
                name: name.to_string(),
                building: building.to_string(),
            },
        )?;
    }

    for link in legacy_links() {
        db::upsert_legacy_link(conn, &link)?;
    }

    Ok(BUILDINGS.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_references_only_known_buildings() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        assert_eq!(load_sample_data(&conn).unwrap(), BUILDINGS.len());

        let catalog = db::load_catalog(&conn).unwrap();
        for s in &catalog.synergy_upgrades {
            assert!(catalog.building(&s.primary_building).is_some(), "{}", s.name);
            assert!(catalog.building(&s.secondary_building).is_some(), "{}", s.name);
        }
        for g in &catalog.grandma_synergies {
            // The tier divisor needs a partner declared after Grandma
            assert!(catalog.building(&g.building).is_some_and(|b| b.id > 1), "{}", g.name);
        }
        assert_eq!(catalog.building("Portal").map(|b| b.id), Some(10));
    }

    #[test]
    fn every_building_past_grandma_has_a_grandma_type() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        load_sample_data(&conn).unwrap();
        let catalog = db::load_catalog(&conn).unwrap();

        for b in catalog.buildings.iter().filter(|b| b.id > 1) {
            assert!(
                catalog.grandma_synergies.iter().any(|g| g.building == b.name),
                "no grandma type for {}",
                b.name
            );
        }
        assert_eq!(catalog.grandma_synergies.len(), BUILDINGS.len() - 2);
        for late in ["Chancemaker", "Fractal engine", "Idleverse", "Cortex baker", "You"] {
            assert!(catalog.synergies_touching(late).count() > 0, "{late}");
        }
    }

    #[test]
    fn lucky_grandmas_boost_chancemakers() {
        use crate::analyzer::synergy_bonus_percent;
        use crate::models::{HostBuilding, HostState, HostUpgrade};
        use crate::snapshot::EconomySnapshot;

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        load_sample_data(&conn).unwrap();
        let catalog = db::load_catalog(&conn).unwrap();

        let building = |id: u32, name: &str, amount: u64, total: f64| HostBuilding {
            id,
            name: name.to_string(),
            amount,
            stored_total_cps: Some(total),
            ..Default::default()
        };
        let state = HostState {
            cookies_ps: 1100.0,
            global_cps_mult: 1.0,
            buildings: vec![
                building(1, "Grandma", 100, 100.0),
                building(14, "Chancemaker", 1, 1000.0),
            ],
            upgrades: vec![HostUpgrade::owned("Lucky grandmas")],
            ..Default::default()
        };
        let snap = EconomySnapshot::from_host(&catalog, &state).unwrap();
        let grandma = snap.unit_named("Grandma").unwrap();

        // m = 100 * 0.01 / (14 - 1)
        let m = 100.0 * 0.01 / 13.0;
        let expected = (1000.0 - 1000.0 / (1.0 + m)) / 1100.0 * 100.0;
        let got = synergy_bonus_percent(grandma, &snap);
        assert!((got - expected).abs() < 1e-9);
        assert!((got - 6.4935).abs() < 1e-3);
    }
}
