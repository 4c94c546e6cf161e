//! Game package descriptors

use crate::PackageId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reel grid of a package, e.g. 5 reels by 3 rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelLayout {
    pub reels: u8,
    pub rows: u8,
}

impl ReelLayout {
    /// Number of visible symbol positions
    pub fn positions(&self) -> u32 {
        self.reels as u32 * self.rows as u32
    }
}

impl fmt::Display for ReelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.reels, self.rows)
    }
}

wire_enum! {
    /// Volatility tier of the package math model
    Volatility {
        Low => "low",
        Medium => "medium",
        High => "high",
        Extreme => "extreme",
    }
}

impl Volatility {
    /// Human-readable label used in checklist titles
    pub fn label(&self) -> &'static str {
        match self {
            Volatility::Low => "Low",
            Volatility::Medium => "Medium",
            Volatility::High => "High",
            Volatility::Extreme => "Extreme",
        }
    }
}

wire_enum! {
    /// Role a symbol plays on the reels
    SymbolKind {
        Wild => "wild",
        Scatter => "scatter",
        Bonus => "bonus",
        High => "high",
        Low => "low",
    }
}

/// A reel symbol and its pay table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Display name
    pub name: String,
    /// Symbol role
    pub kind: SymbolKind,
    /// Payout per combination, keyed by match count or combo name ("3", "5", "any 3")
    #[serde(default)]
    pub payouts: IndexMap<String, String>,
}

impl Symbol {
    /// Payouts rendered as "3: 5x, 4: 20x"
    pub fn payout_summary(&self) -> String {
        if self.payouts.is_empty() {
            return "no line pays".to_string();
        }
        self.payouts
            .iter()
            .map(|(combo, pays)| format!("{}: {}", combo, pays))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Static descriptor of a game package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePackage {
    /// Catalog key
    pub id: PackageId,
    /// Display name
    pub name: String,
    /// Reel grid
    pub layout: ReelLayout,
    /// Number of paylines
    pub paylines: u32,
    /// Maximum win as a multiple of the total bet
    pub max_win: u32,
    /// Volatility tier
    pub volatility: Volatility,
    /// Minimum total bet
    pub min_bet: f64,
    /// Maximum total bet
    pub max_bet: f64,
    /// Named features in display order
    #[serde(default)]
    pub features: Vec<String>,
    /// Symbols in paytable order
    pub symbols: Vec<Symbol>,
}

/// Lightweight listing entry for package pickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub id: PackageId,
    pub name: String,
    pub layout: String,
    pub paylines: u32,
    pub volatility: Volatility,
}

impl GamePackage {
    /// Summary for listings
    pub fn summary(&self) -> PackageSummary {
        PackageSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            layout: self.layout.to_string(),
            paylines: self.paylines,
            volatility: self.volatility,
        }
    }

    /// Bet range rendered with two decimals
    pub fn bet_range(&self) -> String {
        format!("{:.2} to {:.2}", self.min_bet, self.max_bet)
    }
}
