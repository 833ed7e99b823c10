//! Run status shown around the attribution table
//!
//! Prestige progress, active buffs, upgrade stock and building prices, all
//! read from the same host export as the snapshot. Like the analyzer,
//! missing or degenerate figures resolve to 0 instead of failing.

use regex::Regex;

use crate::error::Result;
use crate::format::{NumberStyle, format_large_number};
use crate::models::{HostBuilding, HostState};

/// Cookies per prestige level, cubed: level n needs n³ × 1e12 baked all time.
const COOKIES_PER_PRESTIGE: f64 = 1e12;
const DEFAULT_FPS: f64 = 30.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Upgrade pools sold in the regular store.
const STORE_POOLS: [&str; 2] = ["cookie", "upgrade"];

/// Store bulk sizes.
pub const BULK_AMOUNTS: [u32; 3] = [1, 10, 100];

/// Prestige gained this run and how long the run has lasted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Legacy {
    pub levels_gained: u64,
    /// Fraction of the way to the next level, 0..1.
    pub progress: f64,
    pub run_days: f64,
}

/// Work out prestige gains and run length from the export.
///
/// `now_ms` is the wall clock in epoch milliseconds, used only when the
/// export carries no run timer.
pub fn legacy(state: &HostState, now_ms: f64) -> Legacy {
    let total = finite(state.cookies_earned) + finite(state.cookies_reset);
    let exact = if total <= 0.0 {
        0.0
    } else {
        (total / COOKIES_PER_PRESTIGE).powf(1.0 / 3.0)
    };
    let floored = exact.floor();
    let gained = (floored - finite(state.prestige)).max(0.0);

    let mut progress = exact - floored;
    if progress >= 1.0 {
        progress = 0.0;
    }

    Legacy {
        levels_gained: gained as u64,
        progress: finite(progress).clamp(0.0, 1.0),
        run_days: run_seconds(state, now_ms) / SECONDS_PER_DAY,
    }
}

/// Seconds since the run began.
///
/// Hosts disagree on the unit of `runGameTime`: very large values are
/// milliseconds, mid-sized ones frames, and anything from a day up is
/// already seconds. Without a timer the first usable start stamp wins.
fn run_seconds(state: &HostState, now_ms: f64) -> f64 {
    let fps = state.fps.filter(|f| f.is_finite() && *f > 0.0).unwrap_or(DEFAULT_FPS);
    let raw = state.run_game_time.map(finite).unwrap_or(0.0);

    let mut secs = 0.0;
    if raw > 0.0 {
        secs = if raw >= 1e9 {
            raw / 1000.0
        } else if raw >= 1e7 {
            raw / fps
        } else if raw >= SECONDS_PER_DAY {
            raw
        } else {
            raw / fps
        };
    }

    let starts = [
        state.start_date,
        state.session_start_time,
        state.ascension_time,
        state.date,
    ];
    for start in starts.into_iter().flatten() {
        if secs > 0.0 {
            break;
        }
        if start.is_finite() && start > 0.0 {
            secs = (now_ms - start) / 1000.0;
        }
    }

    finite(secs).max(0.0)
}

/// Run length for display: two decimals under a day, one above.
pub fn format_run_days(days: f64) -> String {
    if days < 0.01 {
        "< 0.01".to_string()
    } else if days < 1.0 {
        format!("{:.2}", days)
    } else {
        format!("{:.1}", days)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuffStatus {
    pub buffed: bool,
    pub debuffed: bool,
}

/// Sorts active buffs into helpful and harmful ones by name.
pub struct BuffClassifier {
    debuff: Regex,
}

impl BuffClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            debuff: Regex::new(r"(?i)clot|cursed finger|rusted")?,
        })
    }

    pub fn is_debuff(&self, name: &str) -> bool {
        self.debuff.is_match(name)
    }

    /// Expired buffs (time 0) are ignored.
    pub fn classify(&self, state: &HostState) -> BuffStatus {
        let mut status = BuffStatus::default();
        for (name, _) in state.buffs.iter().filter(|(_, b)| b.time > 0.0) {
            if self.is_debuff(name) {
                status.debuffed = true;
            } else {
                status.buffed = true;
            }
        }
        status
    }
}

/// An upgrade that can appear in the store right now.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreUpgrade {
    pub name: String,
    pub pool: String,
    pub price: Option<f64>,
    pub can_buy: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpgradeSummary {
    pub invested: usize,
    pub available: usize,
    pub locked: usize,
    /// Unlocked, unbought store upgrades, cheapest first.
    pub store: Vec<StoreUpgrade>,
}

pub fn summarize_upgrades(state: &HostState) -> UpgradeSummary {
    let mut summary = UpgradeSummary::default();
    for u in &state.upgrades {
        if u.bought {
            summary.invested += 1;
        }
        if u.locked {
            summary.locked += 1;
        } else if !u.bought {
            summary.available += 1;
            if STORE_POOLS.contains(&u.pool.as_str()) {
                summary.store.push(StoreUpgrade {
                    name: u.name.clone(),
                    pool: u.pool.clone(),
                    price: u.price,
                    can_buy: affordable(u.price, state.cookies),
                });
            }
        }
    }
    // Unpriced entries sort last; ties keep export order.
    summary
        .store
        .sort_by(|a, b| price_key(a.price).total_cmp(&price_key(b.price)));
    summary
}

fn price_key(price: Option<f64>) -> f64 {
    price.filter(|p| p.is_finite()).unwrap_or(f64::INFINITY)
}

fn affordable(price: Option<f64>, cookies: f64) -> bool {
    price.is_some_and(|p| p.is_finite() && cookies >= p)
}

/// Buy and sell prices for one bulk size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulkOffer {
    pub amount: u32,
    pub buy: Option<f64>,
    pub sell: Option<f64>,
    pub can_buy: bool,
}

/// Store offers for a building at every bulk size. A single purchase falls
/// back to the building's listed price.
pub fn bulk_offers(building: &HostBuilding, cookies: f64) -> [BulkOffer; 3] {
    BULK_AMOUNTS.map(|amount| {
        let mut buy = building.bulk_buy.get(amount);
        if amount == 1 {
            buy = buy.or(building.price);
        }
        BulkOffer {
            amount,
            buy,
            sell: building.bulk_sell.get(amount),
            can_buy: affordable(buy, cookies),
        }
    })
}

/// Everything shown above and below the attribution table.
#[derive(Debug, Clone)]
pub struct RunStatus {
    pub cookies: f64,
    pub cookies_ps: f64,
    pub buffs: BuffStatus,
    pub legacy: Legacy,
    pub upgrades: UpgradeSummary,
    pub prices: Vec<(String, [BulkOffer; 3])>,
}

impl RunStatus {
    pub fn from_host(state: &HostState, classifier: &BuffClassifier, now_ms: f64) -> Self {
        let prices = state
            .buildings
            .iter()
            .filter(|b| !b.locked)
            .map(|b| (b.name.clone(), bulk_offers(b, state.cookies)))
            .collect();

        Self {
            cookies: finite(state.cookies),
            cookies_ps: finite(state.cookies_ps),
            buffs: classifier.classify(state),
            legacy: legacy(state, now_ms),
            upgrades: summarize_upgrades(state),
            prices,
        }
    }

    pub fn render_header(&self, style: NumberStyle) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Cookies: {}   CpS: {}",
            format_large_number(self.cookies, style, 3),
            format_large_number(self.cookies_ps, style, 3)
        ));
        if self.buffs.buffed {
            output.push_str(" [buff]");
        }
        if self.buffs.debuffed {
            output.push_str(" [debuff]");
        }
        output.push('\n');

        output.push_str(&format!(
            "Legacy: +{} ({} to next)   Run: {} days\n",
            format_large_number(self.legacy.levels_gained as f64, style, 3),
            format_large_number(self.legacy.progress, NumberStyle::Percentage, 1),
            format_run_days(self.legacy.run_days)
        ));

        output.push_str(&format!(
            "Upgrades: {} invested / {} available / {} locked\n",
            self.upgrades.invested, self.upgrades.available, self.upgrades.locked
        ));
        output
    }

    /// Store upgrades with prices; `*` marks the ones affordable now.
    pub fn render_upgrades(&self, style: NumberStyle) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "=== Upgrades === ({} invested, {} available, {} locked)\n\n",
            self.upgrades.invested, self.upgrades.available, self.upgrades.locked
        ));

        if self.upgrades.store.is_empty() {
            output.push_str("Nothing in the store.\n");
            return output;
        }

        output.push_str(&format!("{:<36} {:<8} {:>14}\n", "Upgrade", "Pool", "Price"));
        output.push_str(&format!("{}\n", "-".repeat(61)));
        for u in &self.upgrades.store {
            let price = u
                .price
                .map(|p| format_large_number(p, style, 3))
                .unwrap_or_else(|| "?".to_string());
            output.push_str(&format!(
                "{:<36} {:<8} {:>14} {}\n",
                u.name,
                u.pool,
                price,
                if u.can_buy { "*" } else { "" }
            ));
        }
        output
    }

    /// Bulk buy prices per unlocked building; `*` marks affordable ones.
    pub fn render_prices(&self, style: NumberStyle) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{:<24} {:>15} {:>15} {:>15}\n",
            "Store", "Buy 1", "Buy 10", "Buy 100"
        ));
        output.push_str(&format!("{}\n", "-".repeat(72)));
        for (name, offers) in &self.prices {
            let cells: Vec<String> = offers
                .iter()
                .map(|o| match o.buy {
                    Some(p) => format!(
                        "{}{}",
                        format_large_number(p, style, 3),
                        if o.can_buy { "*" } else { " " }
                    ),
                    None => "- ".to_string(),
                })
                .collect();
            output.push_str(&format!(
                "{:<24} {:>15} {:>15} {:>15}\n",
                name, cells[0], cells[1], cells[2]
            ));
        }
        output
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
