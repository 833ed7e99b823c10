//! Immutable economy snapshots fed to the analyzer
//!
//! A snapshot is rebuilt from the host on every tick. Synergy relationships
//! are resolved to unit identities here, so the analyzer only ever follows
//! ids and never compares building names.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{BossModeError, Result};
use crate::models::{Catalog, HostState, LegacyKind};

/// Weight applied per owned unit when querying a synergy from its first tie.
pub const PRIMARY_WEIGHT: f64 = 0.001;
/// Weight applied per owned unit when querying a synergy from its second tie.
pub const SECONDARY_WEIGHT: f64 = 0.05;
/// Per-Grandma weight of a grandma synergy, before the tier divisor.
pub const GRANDMA_SYNERGY_WEIGHT: f64 = 0.01;
/// Building that owns every grandma synergy.
pub const GRANDMA: &str = "Grandma";

/// Stable identity of a production unit: the host's ordinal index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which end of a synergy relationship the owning unit sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynergyRole {
    Primary,
    Secondary,
}

/// How a link turns the owner's count into bonus production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `m = count * weight`; the partner would produce `rate / (1 + m)` without it.
    Generic,
    /// Like `Generic`, with `m` further divided by `partner.id - 1`.
    Tiered,
    /// Adds `count * weight * partner.count * multiplier` outright.
    FlatPerPartner,
}

/// One directed view of a synergy relationship, as seen from its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct SynergyLink {
    pub partner_id: UnitId,
    pub active: bool,
    pub weight: f64,
    pub role: SynergyRole,
    pub kind: LinkKind,
}

impl SynergyLink {
    pub fn generic(partner_id: UnitId, active: bool, weight: f64, role: SynergyRole) -> Self {
        Self {
            partner_id,
            active,
            weight,
            role,
            kind: LinkKind::Generic,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionUnit {
    pub id: UnitId,
    pub name: String,
    pub count: u64,
    /// Own production before the global multiplier (`count * per-unit rate`).
    pub raw_rate: f64,
    pub locked: bool,
    pub synergy_links: Vec<SynergyLink>,
}

impl ProductionUnit {
    pub fn new(id: u32, name: impl Into<String>, count: u64, raw_rate: f64) -> Self {
        Self {
            id: UnitId(id),
            name: name.into(),
            count,
            raw_rate,
            locked: false,
            synergy_links: Vec::new(),
        }
    }

    pub fn with_link(mut self, link: SynergyLink) -> Self {
        self.synergy_links.push(link);
        self
    }
}

/// Production economy at one instant.
#[derive(Debug, Clone)]
pub struct EconomySnapshot {
    /// Aggregate production after the global multiplier, buffs included.
    pub total_rate: f64,
    pub global_multiplier: f64,
    units: Vec<ProductionUnit>,
    index: HashMap<UnitId, usize>,
}

impl EconomySnapshot {
    /// Build a snapshot. When ids repeat, lookups resolve to the first unit.
    pub fn new(total_rate: f64, global_multiplier: f64, units: Vec<ProductionUnit>) -> Self {
        let mut index = HashMap::with_capacity(units.len());
        for (pos, unit) in units.iter().enumerate() {
            index.entry(unit.id).or_insert(pos);
        }
        Self {
            total_rate,
            global_multiplier,
            units,
            index,
        }
    }

    pub fn units(&self) -> &[ProductionUnit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&ProductionUnit> {
        self.index.get(&id).map(|&pos| &self.units[pos])
    }

    pub fn unit_named(&self, name: &str) -> Option<&ProductionUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Assemble a snapshot from live host state, wiring in every synergy the
    /// catalogue knows about. Links whose buildings are missing from the host
    /// state are skipped.
    pub fn from_host(catalog: &Catalog, state: &HostState) -> Result<Self> {
        let owned: HashSet<&str> = state.owned_upgrades().collect();

        let mut ids: HashMap<&str, UnitId> = HashMap::new();
        let mut seen: HashMap<u32, &str> = HashMap::new();
        for b in &state.buildings {
            if let Some(first) = seen.insert(b.id, b.name.as_str()) {
                return Err(BossModeError::DuplicateUnit {
                    id: b.id,
                    first: first.to_string(),
                    second: b.name.clone(),
                });
            }
            ids.entry(b.name.as_str()).or_insert(UnitId(b.id));
        }

        let mut links: HashMap<UnitId, Vec<SynergyLink>> = HashMap::new();

        // Grandma and legacy links go first; their boosts accumulate before
        // the generic ones in the host's own ordering.
        if let Some(&grandma) = ids.get(GRANDMA) {
            for gs in &catalog.grandma_synergies {
                let Some(&partner) = ids.get(gs.building.as_str()) else {
                    debug!(upgrade = %gs.name, building = %gs.building, "grandma synergy partner not in host state");
                    continue;
                };
                links.entry(grandma).or_default().push(SynergyLink {
                    partner_id: partner,
                    active: owned.contains(gs.name.as_str()),
                    weight: GRANDMA_SYNERGY_WEIGHT,
                    role: SynergyRole::Primary,
                    kind: LinkKind::Tiered,
                });
            }
        }

        for legacy in &catalog.legacy_links {
            let (Some(&source), Some(&partner)) = (
                ids.get(legacy.source_building.as_str()),
                ids.get(legacy.partner_building.as_str()),
            ) else {
                debug!(upgrade = %legacy.name, "legacy link endpoints not in host state");
                continue;
            };
            let kind = match legacy.kind {
                LegacyKind::FlatPerPartner => LinkKind::FlatPerPartner,
            };
            links.entry(source).or_default().push(SynergyLink {
                partner_id: partner,
                active: owned.contains(legacy.name.as_str()),
                weight: legacy.weight,
                role: SynergyRole::Primary,
                kind,
            });
        }

        for s in &catalog.synergy_upgrades {
            let (Some(&primary), Some(&secondary)) = (
                ids.get(s.primary_building.as_str()),
                ids.get(s.secondary_building.as_str()),
            ) else {
                debug!(upgrade = %s.name, "synergy endpoints not in host state");
                continue;
            };
            let active = owned.contains(s.name.as_str());
            links.entry(primary).or_default().push(SynergyLink::generic(
                secondary,
                active,
                PRIMARY_WEIGHT,
                SynergyRole::Primary,
            ));
            if secondary == primary {
                continue;
            }
            links.entry(secondary).or_default().push(SynergyLink::generic(
                primary,
                active,
                SECONDARY_WEIGHT,
                SynergyRole::Secondary,
            ));
        }

        let units = state
            .buildings
            .iter()
            .map(|b| {
                let id = UnitId(b.id);
                ProductionUnit {
                    id,
                    name: b.name.clone(),
                    count: b.amount,
                    raw_rate: b.raw_rate(),
                    locked: b.locked,
                    synergy_links: links.remove(&id).unwrap_or_default(),
                }
            })
            .collect();

        Ok(Self::new(state.cookies_ps, state.global_cps_mult, units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        GrandmaSynergyDef, HostBuilding, HostUpgrade, LegacyLinkDef, SynergyUpgradeDef,
    };

    fn host(id: u32, name: &str, amount: u64, total: f64) -> HostBuilding {
        HostBuilding {
            id,
            name: name.to_string(),
            amount,
            stored_total_cps: Some(total),
            ..Default::default()
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            synergy_upgrades: vec![SynergyUpgradeDef {
                name: "Future almanacs".to_string(),
                primary_building: "Farm".to_string(),
                secondary_building: "Time machine".to_string(),
            }],
            grandma_synergies: vec![GrandmaSynergyDef {
                name: "Farmer grandmas".to_string(),
                building: "Farm".to_string(),
            }],
            legacy_links: vec![LegacyLinkDef {
                name: "Elder Pact".to_string(),
                kind: LegacyKind::FlatPerPartner,
                source_building: "Portal".to_string(),
                partner_building: "Grandma".to_string(),
                weight: 0.05,
            }],
            ..Default::default()
        }
    }

    fn state() -> HostState {
        HostState {
            cookies_ps: 500.0,
            global_cps_mult: 2.0,
            buildings: vec![
                host(1, "Grandma", 10, 20.0),
                host(2, "Farm", 5, 40.0),
                host(10, "Portal", 1, 100.0),
                host(11, "Time machine", 0, 7.0),
            ],
            upgrades: vec![
                HostUpgrade::owned("Future almanacs"),
                HostUpgrade::owned("Elder Pact"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn directed_weights_follow_the_side_queried() {
        let snap = EconomySnapshot::from_host(&catalog(), &state()).unwrap();

        let farm = snap.unit(UnitId(2)).unwrap();
        assert_eq!(
            farm.synergy_links,
            vec![SynergyLink::generic(UnitId(11), true, PRIMARY_WEIGHT, SynergyRole::Primary)]
        );

        let tm = snap.unit(UnitId(11)).unwrap();
        assert_eq!(
            tm.synergy_links,
            vec![SynergyLink::generic(UnitId(2), true, SECONDARY_WEIGHT, SynergyRole::Secondary)]
        );
    }

    #[test]
    fn legacy_links_resolve_to_ids_and_respect_ownership() {
        let snap = EconomySnapshot::from_host(&catalog(), &state()).unwrap();

        let grandma = snap.unit_named("Grandma").unwrap();
        assert_eq!(grandma.synergy_links.len(), 1);
        assert_eq!(grandma.synergy_links[0].kind, LinkKind::Tiered);
        assert_eq!(grandma.synergy_links[0].partner_id, UnitId(2));
        assert!(!grandma.synergy_links[0].active);

        let portal = snap.unit_named("Portal").unwrap();
        assert_eq!(portal.synergy_links[0].kind, LinkKind::FlatPerPartner);
        assert_eq!(portal.synergy_links[0].partner_id, UnitId(1));
        assert!(portal.synergy_links[0].active);
    }

    #[test]
    fn stale_rate_is_dropped_for_unowned_buildings() {
        let snap = EconomySnapshot::from_host(&catalog(), &state()).unwrap();
        assert_eq!(snap.unit(UnitId(11)).unwrap().raw_rate, 0.0);
        assert_eq!(snap.total_rate, 500.0);
        assert_eq!(snap.global_multiplier, 2.0);
    }

    #[test]
    fn missing_partners_are_skipped() {
        let mut st = state();
        st.buildings.retain(|b| b.name != "Time machine");
        let snap = EconomySnapshot::from_host(&catalog(), &st).unwrap();
        assert!(snap.unit_named("Farm").unwrap().synergy_links.is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut st = state();
        st.buildings.push(host(2, "Mine", 1, 1.0));
        let err = EconomySnapshot::from_host(&catalog(), &st).unwrap_err();
        assert!(matches!(err, BossModeError::DuplicateUnit { id: 2, .. }));
    }
}
