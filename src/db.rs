//! Catalogue schema and operations

use anyhow::{Result, anyhow};
use rusqlite::Connection;

use crate::models::{
    BuildingDef, Catalog, GrandmaSynergyDef, LegacyKind, LegacyLinkDef, SynergyUpgradeDef,
};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Building types in host declaration order
        CREATE TABLE IF NOT EXISTS buildings (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            plural TEXT
        );

        -- Upgrades tying two buildings together
        CREATE TABLE IF NOT EXISTS synergy_upgrades (
            name TEXT PRIMARY KEY,
            primary_building TEXT NOT NULL,
            secondary_building TEXT NOT NULL
        );

        -- Grandma-type upgrades, each tied to one other building
        CREATE TABLE IF NOT EXISTS grandma_synergies (
            name TEXT PRIMARY KEY,
            building TEXT NOT NULL
        );

        -- Fixed relationships with their own formulas
        CREATE TABLE IF NOT EXISTS legacy_links (
            name TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            source_building TEXT NOT NULL,
            partner_building TEXT NOT NULL,
            weight REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_synergy_primary ON synergy_upgrades(primary_building);
        CREATE INDEX IF NOT EXISTS idx_synergy_secondary ON synergy_upgrades(secondary_building);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a building
pub fn upsert_building(conn: &Connection, building: &BuildingDef) -> Result<()> {
    // A re-extraction may renumber buildings; drop any stale row holding the name.
    conn.execute(
        "DELETE FROM buildings WHERE name = ?1 AND id != ?2",
        (&building.name, building.id),
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO buildings (id, name, plural) VALUES (?1, ?2, ?3)",
        (building.id, &building.name, &building.plural),
    )?;
    Ok(())
}

pub fn upsert_synergy_upgrade(conn: &Connection, upgrade: &SynergyUpgradeDef) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO synergy_upgrades (name, primary_building, secondary_building)
         VALUES (?1, ?2, ?3)",
        (
            &upgrade.name,
            &upgrade.primary_building,
            &upgrade.secondary_building,
        ),
    )?;
    Ok(())
}

pub fn upsert_grandma_synergy(conn: &Connection, upgrade: &GrandmaSynergyDef) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO grandma_synergies (name, building) VALUES (?1, ?2)",
        (&upgrade.name, &upgrade.building),
    )?;
    Ok(())
}

pub fn upsert_legacy_link(conn: &Connection, link: &LegacyLinkDef) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO legacy_links (name, kind, source_building, partner_building, weight)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &link.name,
            link.kind.as_str(),
            &link.source_building,
            &link.partner_building,
            link.weight,
        ),
    )?;
    Ok(())
}

/// Clear the whole catalogue (for re-extraction)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM legacy_links;
        DELETE FROM grandma_synergies;
        DELETE FROM synergy_upgrades;
        DELETE FROM buildings;
        "#,
    )?;
    Ok(())
}

/// List all buildings in declaration order
pub fn list_buildings(conn: &Connection) -> Result<Vec<BuildingDef>> {
    let mut stmt = conn.prepare("SELECT id, name, plural FROM buildings ORDER BY id")?;

    let rows = stmt.query_map([], |row| {
        Ok(BuildingDef {
            id: row.get(0)?,
            name: row.get(1)?,
            plural: row.get(2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List synergy upgrades in insertion order, which follows the host's declarations
pub fn list_synergy_upgrades(conn: &Connection) -> Result<Vec<SynergyUpgradeDef>> {
    let mut stmt = conn.prepare(
        "SELECT name, primary_building, secondary_building FROM synergy_upgrades ORDER BY rowid",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(SynergyUpgradeDef {
            name: row.get(0)?,
            primary_building: row.get(1)?,
            secondary_building: row.get(2)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

pub fn list_grandma_synergies(conn: &Connection) -> Result<Vec<GrandmaSynergyDef>> {
    let mut stmt = conn.prepare("SELECT name, building FROM grandma_synergies ORDER BY rowid")?;

    let rows = stmt.query_map([], |row| {
        Ok(GrandmaSynergyDef {
            name: row.get(0)?,
            building: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

pub fn list_legacy_links(conn: &Connection) -> Result<Vec<LegacyLinkDef>> {
    let mut stmt = conn.prepare(
        "SELECT name, kind, source_building, partner_building, weight
         FROM legacy_links ORDER BY rowid",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, f64>(4)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (name, kind, source_building, partner_building, weight) = row?;
        let kind = LegacyKind::parse(&kind)
            .ok_or_else(|| anyhow!("unknown legacy link kind '{}' for {}", kind, name))?;
        results.push(LegacyLinkDef {
            name,
            kind,
            source_building,
            partner_building,
            weight,
        });
    }
    Ok(results)
}

/// Load the full catalogue into memory
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    Ok(Catalog {
        buildings: list_buildings(conn)?,
        synergy_upgrades: list_synergy_upgrades(conn)?,
        grandma_synergies: list_grandma_synergies(conn)?,
        legacy_links: list_legacy_links(conn)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn catalog_keeps_declaration_order() {
        let conn = conn();
        for (id, name) in [(2, "Farm"), (0, "Cursor"), (1, "Grandma")] {
            upsert_building(
                &conn,
                &BuildingDef {
                    id,
                    name: name.to_string(),
                    plural: None,
                },
            )
            .unwrap();
        }
        for (name, a, b) in [
            ("Rain prayer", "Farm", "Temple"),
            ("Future almanacs", "Farm", "Time machine"),
        ] {
            upsert_synergy_upgrade(
                &conn,
                &SynergyUpgradeDef {
                    name: name.to_string(),
                    primary_building: a.to_string(),
                    secondary_building: b.to_string(),
                },
            )
            .unwrap();
        }

        let catalog = load_catalog(&conn).unwrap();
        let names: Vec<_> = catalog.buildings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["Cursor", "Grandma", "Farm"]);
        assert_eq!(catalog.synergy_upgrades[0].name, "Rain prayer");
        assert_eq!(catalog.synergy_upgrades[1].name, "Future almanacs");
    }

    #[test]
    fn renumbered_building_replaces_old_row() {
        let conn = conn();
        let mut farm = BuildingDef {
            id: 2,
            name: "Farm".to_string(),
            plural: Some("farms".to_string()),
        };
        upsert_building(&conn, &farm).unwrap();
        farm.id = 3;
        upsert_building(&conn, &farm).unwrap();

        let buildings = list_buildings(&conn).unwrap();
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].id, 3);
    }

    #[test]
    fn legacy_links_survive_storage_and_clear() {
        let conn = conn();
        let link = LegacyLinkDef {
            name: "Elder Pact".to_string(),
            kind: LegacyKind::FlatPerPartner,
            source_building: "Portal".to_string(),
            partner_building: "Grandma".to_string(),
            weight: 0.05,
        };
        upsert_legacy_link(&conn, &link).unwrap();
        assert_eq!(list_legacy_links(&conn).unwrap(), vec![link]);

        clear_catalog(&conn).unwrap();
        assert!(list_legacy_links(&conn).unwrap().is_empty());
    }

    #[test]
    fn unknown_legacy_kind_is_an_error() {
        let conn = conn();
        conn.execute(
            "INSERT INTO legacy_links VALUES ('Mystery', 'bogus', 'A', 'B', 1.0)",
            [],
        )
        .unwrap();
        assert!(list_legacy_links(&conn).is_err());
    }
}
