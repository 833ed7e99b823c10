//! Data models for the building catalogue and live host state

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// A building type as declared by the game content.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingDef {
    pub id: u32, // Host ordinal: declaration order, Cursor = 0
    pub name: String,
    pub plural: Option<String>,
}

/// An upgrade that links two buildings; owning more of either boosts the other.
#[derive(Debug, Clone, PartialEq)]
pub struct SynergyUpgradeDef {
    pub name: String,
    pub primary_building: String,
    pub secondary_building: String,
}

/// A grandma-type upgrade tying Grandmas to one other building.
#[derive(Debug, Clone, PartialEq)]
pub struct GrandmaSynergyDef {
    pub name: String,
    pub building: String,
}

/// Fixed relationships that predate the generic synergy upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyKind {
    FlatPerPartner,
}

impl LegacyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegacyKind::FlatPerPartner => "flat_per_partner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flat_per_partner" => Some(LegacyKind::FlatPerPartner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyLinkDef {
    pub name: String, // Gating upgrade
    pub kind: LegacyKind,
    pub source_building: String,
    pub partner_building: String,
    pub weight: f64,
}

/// Everything known about the game's content, independent of any save.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub buildings: Vec<BuildingDef>,
    pub synergy_upgrades: Vec<SynergyUpgradeDef>,
    pub grandma_synergies: Vec<GrandmaSynergyDef>,
    pub legacy_links: Vec<LegacyLinkDef>,
}

impl Catalog {
    pub fn building(&self, name: &str) -> Option<&BuildingDef> {
        self.buildings.iter().find(|b| b.name == name)
    }

    /// Synergy upgrades in which the named building takes part, on either side.
    pub fn synergies_touching<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a SynergyUpgradeDef> + 'a {
        self.synergy_upgrades
            .iter()
            .filter(move |s| s.primary_building == name || s.secondary_building == name)
    }
}

/// Live state as exported by the in-game adapter on each tick.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostState {
    pub cookies_ps: f64,
    #[serde(default = "default_multiplier")]
    pub global_cps_mult: f64,
    #[serde(default)]
    pub buildings: Vec<HostBuilding>,
    #[serde(default)]
    pub upgrades: Vec<HostUpgrade>,

    /// Cookies in the bank.
    #[serde(default)]
    pub cookies: f64,
    /// Active buffs keyed by name, as the host keeps them.
    #[serde(default)]
    pub buffs: BTreeMap<String, HostBuff>,

    // Prestige inputs
    #[serde(default)]
    pub cookies_earned: f64,
    #[serde(default)]
    pub cookies_reset: f64,
    #[serde(default)]
    pub prestige: f64,

    // Run clock. `run_game_time` may be frames, seconds or milliseconds
    // depending on the host version; the others are epoch milliseconds.
    #[serde(default)]
    pub run_game_time: Option<f64>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub start_date: Option<f64>,
    #[serde(default)]
    pub session_start_time: Option<f64>,
    #[serde(default)]
    pub ascension_time: Option<f64>,
    #[serde(default)]
    pub date: Option<f64>,
}

impl HostState {
    /// Read a state export written by the in-game adapter.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Names of every upgrade the player has bought.
    pub fn owned_upgrades(&self) -> impl Iterator<Item = &str> {
        self.upgrades
            .iter()
            .filter(|u| u.bought)
            .map(|u| u.name.as_str())
    }
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct HostBuff {
    /// Frames left; 0 once expired.
    #[serde(default)]
    pub time: f64,
}

/// One upgrade from the export.
///
/// Older adapters list only the names of owned upgrades, so a bare string
/// is read as a bought upgrade from the regular pool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "UpgradeRecord")]
pub struct HostUpgrade {
    pub id: Option<u32>,
    pub name: String,
    pub price: Option<f64>,
    pub bought: bool,
    pub locked: bool,
    pub pool: String,
}

impl HostUpgrade {
    pub fn owned(name: &str) -> Self {
        HostUpgrade {
            id: None,
            name: name.to_string(),
            price: None,
            bought: true,
            locked: false,
            pool: default_pool(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UpgradeRecord {
    Owned(String),
    Full {
        #[serde(default)]
        id: Option<u32>,
        name: String,
        #[serde(default)]
        price: Option<f64>,
        #[serde(default)]
        bought: bool,
        #[serde(default)]
        locked: bool,
        #[serde(default = "default_pool")]
        pool: String,
    },
}

impl From<UpgradeRecord> for HostUpgrade {
    fn from(record: UpgradeRecord) -> Self {
        match record {
            UpgradeRecord::Owned(name) => HostUpgrade::owned(&name),
            UpgradeRecord::Full {
                id,
                name,
                price,
                bought,
                locked,
                pool,
            } => HostUpgrade {
                id,
                name,
                price,
                bought,
                locked,
                pool: if pool.is_empty() { default_pool() } else { pool },
            },
        }
    }
}

fn default_pool() -> String {
    "upgrade".to_string()
}

/// Store prices for buying or selling 1, 10 and 100 at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct BulkPrices {
    #[serde(rename = "1", default)]
    pub one: Option<f64>,
    #[serde(rename = "10", default)]
    pub ten: Option<f64>,
    #[serde(rename = "100", default)]
    pub hundred: Option<f64>,
}

impl BulkPrices {
    pub fn get(&self, amount: u32) -> Option<f64> {
        match amount {
            1 => self.one,
            10 => self.ten,
            100 => self.hundred,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostBuilding {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub amount: u64,
    #[serde(default)]
    pub stored_total_cps: Option<f64>,
    #[serde(default)]
    pub stored_cps: Option<f64>,
    #[serde(default)]
    pub cps: Option<f64>,
    #[serde(default)]
    pub locked: bool,
    /// Price of the next single building.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub bulk_buy: BulkPrices,
    #[serde(default)]
    pub bulk_sell: BulkPrices,
}

impl HostBuilding {
    /// Raw production of this building before the global multiplier.
    ///
    /// Prefers the host's stored total, then per-building figures scaled by
    /// the amount owned. Always 0 when nothing is owned, so stale totals
    /// never leak into the report.
    pub fn raw_rate(&self) -> f64 {
        if self.amount == 0 {
            return 0.0;
        }
        let amount = self.amount as f64;
        let rate = if let Some(total) = self.stored_total_cps {
            total
        } else if let Some(per) = self.stored_cps {
            per * amount
        } else if let Some(per) = self.cps {
            per * amount
        } else {
            0.0
        };
        if rate.is_finite() { rate } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building(amount: u64) -> HostBuilding {
        HostBuilding {
            id: 2,
            name: "Farm".to_string(),
            amount,
            ..Default::default()
        }
    }

    #[test]
    fn raw_rate_prefers_stored_total() {
        let b = HostBuilding {
            stored_total_cps: Some(80.0),
            stored_cps: Some(3.0),
            cps: Some(1.0),
            ..building(10)
        };
        assert_eq!(b.raw_rate(), 80.0);
    }

    #[test]
    fn raw_rate_scales_per_building_figures() {
        let stored = HostBuilding {
            stored_cps: Some(3.0),
            cps: Some(1.0),
            ..building(10)
        };
        assert_eq!(stored.raw_rate(), 30.0);

        let plain = HostBuilding {
            cps: Some(1.5),
            ..building(4)
        };
        assert_eq!(plain.raw_rate(), 6.0);
    }

    #[test]
    fn raw_rate_is_zero_when_none_owned() {
        let b = HostBuilding {
            stored_total_cps: Some(999.0),
            cps: Some(8.0),
            ..building(0)
        };
        assert_eq!(b.raw_rate(), 0.0);
    }

    #[test]
    fn host_state_reads_camel_case_and_defaults() {
        let json = r#"{
            "cookiesPs": 12.5,
            "buildings": [{ "id": 0, "name": "Cursor", "amount": 3, "storedTotalCps": 0.3 }]
        }"#;
        let state: HostState = serde_json::from_str(json).unwrap();
        assert_eq!(state.global_cps_mult, 1.0);
        assert!(state.upgrades.is_empty());
        assert_eq!(state.buildings[0].stored_total_cps, Some(0.3));
        assert!(!state.buildings[0].locked);
        assert_eq!(state.cookies, 0.0);
        assert!(state.buffs.is_empty());
        assert_eq!(state.run_game_time, None);
    }

    #[test]
    fn upgrades_accept_names_and_records() {
        let json = r#"{
            "cookiesPs": 1,
            "upgrades": [
                "Farmer grandmas",
                { "id": 7, "name": "Plastic mouse", "price": 50000, "locked": false },
                { "name": "Lucky day", "bought": true, "pool": "" },
                { "name": "Milk chocolate butter biscuit", "pool": "cookie", "locked": true }
            ]
        }"#;
        let state: HostState = serde_json::from_str(json).unwrap();
        assert_eq!(state.upgrades[0], HostUpgrade::owned("Farmer grandmas"));
        assert_eq!(state.upgrades[1].id, Some(7));
        assert_eq!(state.upgrades[1].price, Some(50000.0));
        assert!(!state.upgrades[1].bought);
        assert_eq!(state.upgrades[2].pool, "upgrade");
        assert_eq!(state.upgrades[3].pool, "cookie");
        let owned: Vec<_> = state.owned_upgrades().collect();
        assert_eq!(owned, ["Farmer grandmas", "Lucky day"]);
    }

    #[test]
    fn buffs_and_bulk_prices_use_host_keys() {
        let json = r#"{
            "cookiesPs": 1,
            "buffs": { "Frenzy": { "time": 120 }, "Clot": {} },
            "buildings": [{
                "id": 2, "name": "Farm", "amount": 1, "price": 1100,
                "bulkBuy": { "1": 1100, "10": 23000, "100": null },
                "bulkSell": { "1": 275 }
            }]
        }"#;
        let state: HostState = serde_json::from_str(json).unwrap();
        assert_eq!(state.buffs["Frenzy"].time, 120.0);
        assert_eq!(state.buffs["Clot"].time, 0.0);
        let farm = &state.buildings[0];
        assert_eq!(farm.bulk_buy.get(10), Some(23000.0));
        assert_eq!(farm.bulk_buy.get(100), None);
        assert_eq!(farm.bulk_sell.get(1), Some(275.0));
        assert_eq!(farm.bulk_sell.get(5), None);
    }

    #[test]
    fn catalog_finds_synergies_on_both_sides() {
        let catalog = Catalog {
            synergy_upgrades: vec![
                SynergyUpgradeDef {
                    name: "Future almanacs".to_string(),
                    primary_building: "Farm".to_string(),
                    secondary_building: "Time machine".to_string(),
                },
                SynergyUpgradeDef {
                    name: "Seismic magic".to_string(),
                    primary_building: "Mine".to_string(),
                    secondary_building: "Wizard tower".to_string(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(catalog.synergies_touching("Time machine").count(), 1);
        assert_eq!(catalog.synergies_touching("Farm").count(), 1);
        assert_eq!(catalog.synergies_touching("Bank").count(), 0);
    }
}
