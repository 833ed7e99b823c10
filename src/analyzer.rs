//! CpS attribution: how much each building produces and how much it unlocks elsewhere
//!
//! Every function here is pure over an [`EconomySnapshot`]. Degenerate input
//! (no production, nothing owned, non-finite arithmetic) resolves to 0
//! rather than an error so one bad row never blocks the rest of a report.

use crate::format::{NumberStyle, format_large_number};
use crate::snapshot::{EconomySnapshot, LinkKind, ProductionUnit, SynergyLink, UnitId};

/// Share of total production coming directly from `unit`, in percent.
///
/// Not clamped: a snapshot taken mid-tick may push this past 100.
pub fn total_share_percent(unit: &ProductionUnit, snapshot: &EconomySnapshot) -> f64 {
    if !has_production(snapshot) || unit.count == 0 {
        return 0.0;
    }
    finite_or_zero(unit.raw_rate * snapshot.global_multiplier / snapshot.total_rate * 100.0)
}

/// Share of total production that `unit` creates in other buildings through
/// its active synergies, in percent.
pub fn synergy_bonus_percent(unit: &ProductionUnit, snapshot: &EconomySnapshot) -> f64 {
    if !has_production(snapshot) || unit.count == 0 {
        return 0.0;
    }
    // Start from +0.0; an empty f64 sum is -0.0.
    let boost = active_effects(unit, snapshot).fold(0.0, |acc, (_, effect)| acc + effect.boost);
    finite_or_zero(boost / snapshot.total_rate * 100.0)
}

/// Bonus created in one partner building.
#[derive(Debug, Clone, PartialEq)]
pub struct SynergyContribution {
    pub partner_id: UnitId,
    pub partner_name: String,
    /// Summed boost factor applied to the partner.
    pub multiplier: f64,
    /// Absolute production the partner gains, after the global multiplier.
    pub boost: f64,
}

/// Per-partner view of [`synergy_bonus_percent`], merged by partner in first-seen order.
pub fn synergy_breakdown(unit: &ProductionUnit, snapshot: &EconomySnapshot) -> Vec<SynergyContribution> {
    let mut out: Vec<SynergyContribution> = Vec::new();
    if !has_production(snapshot) || unit.count == 0 {
        return out;
    }

    for (partner, effect) in active_effects(unit, snapshot) {
        match out.iter_mut().find(|c| c.partner_id == partner.id) {
            Some(existing) => {
                existing.multiplier += effect.multiplier;
                existing.boost += effect.boost;
            }
            None => out.push(SynergyContribution {
                partner_id: partner.id,
                partner_name: partner.name.clone(),
                multiplier: effect.multiplier,
                boost: effect.boost,
            }),
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct LinkEffect {
    multiplier: f64,
    boost: f64,
}

fn active_effects<'a>(
    unit: &'a ProductionUnit,
    snapshot: &'a EconomySnapshot,
) -> impl Iterator<Item = (&'a ProductionUnit, LinkEffect)> + 'a {
    unit.synergy_links
        .iter()
        .filter(|link| link.active)
        .filter_map(move |link| {
            let partner = snapshot.unit(link.partner_id)?;
            let effect = link_effect(unit, link, partner, snapshot.global_multiplier)?;
            Some((partner, effect))
        })
}

fn link_effect(
    unit: &ProductionUnit,
    link: &SynergyLink,
    partner: &ProductionUnit,
    global_multiplier: f64,
) -> Option<LinkEffect> {
    let count = unit.count as f64;
    let before = partner.raw_rate * global_multiplier;

    let multiplier = match link.kind {
        LinkKind::Generic => count * link.weight,
        LinkKind::Tiered => {
            // Divisor is the partner's distance past the Grandma slot.
            if partner.id.0 <= 1 {
                return None;
            }
            count * link.weight * (1.0 / (partner.id.0 as f64 - 1.0))
        }
        LinkKind::FlatPerPartner => {
            let boost = count * link.weight * partner.count as f64 * global_multiplier;
            return Some(LinkEffect {
                multiplier: finite_or_zero(boost / before),
                boost,
            });
        }
    };

    let after = before / (1.0 + multiplier);
    Some(LinkEffect {
        multiplier,
        boost: before - after,
    })
}

fn has_production(snapshot: &EconomySnapshot) -> bool {
    snapshot.total_rate > 0.0
}

/// Non-finite values and negative zero both come out as +0.0.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() && value != 0.0 { value } else { 0.0 }
}

/// One row of an [`EconomyReport`].
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub id: UnitId,
    pub name: String,
    pub count: u64,
    pub rate: f64,
    pub share_percent: f64,
    pub synergy_percent: f64,
    pub locked: bool,
    pub synergies: Vec<SynergyContribution>,
}

/// Attribution for a whole economy.
#[derive(Debug, Clone)]
pub struct EconomyReport {
    pub total_rate: f64,
    pub global_multiplier: f64,
    pub rows: Vec<UnitReport>,
}

impl EconomyReport {
    /// Sum of direct shares; below 100 when buffs add production no building owns.
    pub fn share_sum(&self) -> f64 {
        self.rows.iter().fold(0.0, |acc, r| acc + r.share_percent)
    }

    pub fn synergy_sum(&self) -> f64 {
        self.rows.iter().fold(0.0, |acc, r| acc + r.synergy_percent)
    }

    /// Render as a text table. Locked buildings stay hidden except the first,
    /// which is shown masked below the unlocked rows so there is always
    /// something left to unlock.
    pub fn render(&self, style: NumberStyle, verbose: bool) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "=== Facilities === ({} CpS, x{:.2} global)\n\n",
            format_large_number(self.total_rate, style, 3),
            self.global_multiplier
        ));
        output.push_str(&format!(
            "{:<24} {:>10} {:>14} {:>8} {:>9}\n",
            "Name", "Owned", "CpS", "Share", "Synergy"
        ));
        output.push_str(&format!("{}\n", "-".repeat(69)));

        for row in self.rows.iter().filter(|r| !r.locked) {
            output.push_str(&format!(
                "{:<24} {:>10} {:>14} {:>7.2}% {:>8.2}%\n",
                row.name,
                format_large_number(row.count as f64, style, 3),
                format_large_number(row.rate, style, 3),
                row.share_percent,
                row.synergy_percent
            ));

            if verbose {
                for s in &row.synergies {
                    output.push_str(&format!(
                        "    boosts {} by x{:.3} (+{} CpS)\n",
                        s.partner_name,
                        s.multiplier,
                        format_large_number(s.boost, style, 3)
                    ));
                }
            }
        }
        if self.rows.iter().any(|r| r.locked) {
            output.push_str(&format!(
                "{:<24} {:>10} {:>14} {:>8} {:>9}\n",
                "???", "???", "???", "???", "???"
            ));
        }

        output.push('\n');
        output.push_str(&format!("Direct share total:  {:.2}%\n", self.share_sum()));
        output.push_str(&format!("Synergy share total: {:.2}%\n", self.synergy_sum()));
        output
    }
}

impl std::fmt::Display for EconomyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(NumberStyle::Suffix, false))
    }
}

/// Attribute every unit in the snapshot, in snapshot order.
pub fn analyze(snapshot: &EconomySnapshot) -> EconomyReport {
    let rows = snapshot
        .units()
        .iter()
        .map(|unit| UnitReport {
            id: unit.id,
            name: unit.name.clone(),
            count: unit.count,
            rate: if unit.count == 0 { 0.0 } else { unit.raw_rate },
            share_percent: total_share_percent(unit, snapshot),
            synergy_percent: synergy_bonus_percent(unit, snapshot),
            locked: unit.locked,
            synergies: synergy_breakdown(unit, snapshot),
        })
        .collect();

    EconomyReport {
        total_rate: snapshot.total_rate,
        global_multiplier: snapshot.global_multiplier,
        rows,
    }
}
