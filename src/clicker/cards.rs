//! Card pool and weighted rarity draws.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;

/// Which dataset a card came from. Part of its key, so the same numeric id
/// in both sets yields two distinct cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardSource {
    Game,
    Community,
}

impl CardSource {
    fn prefix(self) -> &'static str {
        match self {
            CardSource::Game => "g",
            CardSource::Community => "c",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    /// Any rarity string the tables don't know about, lowercased.
    Other(String),
}

impl Rarity {
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "" | "common" => Rarity::Common,
            "uncommon" => Rarity::Uncommon,
            "rare" => Rarity::Rare,
            "epic" => Rarity::Epic,
            "legendary" => Rarity::Legendary,
            _ => Rarity::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Other(s) => s,
        }
    }

    fn table_index(&self) -> Option<usize> {
        match self {
            Rarity::Common => Some(0),
            Rarity::Uncommon => Some(1),
            Rarity::Rare => Some(2),
            Rarity::Epic => Some(3),
            Rarity::Legendary => Some(4),
            Rarity::Other(_) => None,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draw weight and passive rate per rarity, indexed common..legendary.
#[derive(Clone, Debug, PartialEq)]
pub struct RarityTable {
    pub weights: [u32; 5],
    pub cps: [f64; 5],
    pub other_weight: u32,
    pub other_cps: f64,
    /// Extra rate per point of mana printed on the card.
    pub mana_cps: f64,
}

impl Default for RarityTable {
    fn default() -> Self {
        Self {
            weights: [45, 30, 15, 8, 2],
            cps: [0.2, 0.4, 0.8, 1.6, 3.2],
            other_weight: 1,
            other_cps: 0.2,
            mana_cps: 0.05,
        }
    }
}

impl RarityTable {
    pub fn weight(&self, rarity: &Rarity) -> u32 {
        rarity
            .table_index()
            .map_or(self.other_weight, |i| self.weights[i])
    }

    pub fn cps(&self, rarity: &Rarity) -> f64 {
        rarity.table_index().map_or(self.other_cps, |i| self.cps[i])
    }
}

/// Identifies one card from one source at one rarity, e.g. `g_12:legendary`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardKey(pub String);

impl CardKey {
    pub fn new(source: CardSource, id: &str, rarity: &Rarity) -> Self {
        Self(format!("{}_{}:{}", source.prefix(), id, rarity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub key: CardKey,
    pub name: String,
    pub rarity: Rarity,
    /// Passive roses per second per owned copy.
    pub cps: f64,
}

/// A card record as it appears in the external datasets.
#[derive(Deserialize)]
struct RawCard {
    id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rarity: Option<String>,
    #[serde(default)]
    mana: Option<Value>,
}

/// Numbers, numeric strings and anything else (as zero).
fn loose_number(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn id_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The full drawable pool.
///
/// Drawing is equivalent to picking uniformly from a bag in which every card
/// appears `weight(rarity)` times; the bag is kept as running totals so it
/// doesn't have to be materialized.
#[derive(Clone, Debug, Default)]
pub struct CardPool {
    cards: Vec<Card>,
    cumulative: Vec<u64>,
    index: HashMap<CardKey, usize>,
}

impl CardPool {
    /// Parse a JSON array of `{ id, name, rarity?, mana? }` records and add
    /// them to the pool. Cards whose key is already present are skipped.
    pub fn extend_from_json(
        &mut self,
        source: CardSource,
        json: &str,
        table: &RarityTable,
    ) -> Result<usize, CatalogError> {
        let raw: Vec<RawCard> = serde_json::from_str(json)?;
        let mut added = 0;
        for rc in raw {
            let rarity = Rarity::parse(rc.rarity.as_deref().unwrap_or("common"));
            let id = id_text(&rc.id);
            let key = CardKey::new(source, &id, &rarity);
            if self.index.contains_key(&key) {
                log::warn!("card pool: duplicate card {key} ignored");
                continue;
            }
            let mana = loose_number(rc.mana.as_ref()).max(0.0);
            let cps = table.cps(&rarity) + mana * table.mana_cps;
            let name = rc.name.unwrap_or(id);
            self.push(
                Card {
                    key,
                    name,
                    rarity,
                    cps,
                },
                table,
            );
            added += 1;
        }
        log::debug!("card pool: added {added} cards, {} total", self.cards.len());
        Ok(added)
    }

    fn push(&mut self, card: Card, table: &RarityTable) {
        let weight = u64::from(table.weight(&card.rarity));
        let total = self.total_weight() + weight;
        self.index.insert(card.key.clone(), self.cards.len());
        self.cards.push(card);
        self.cumulative.push(total);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_weight() == 0
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn get(&self, key: &CardKey) -> Option<&Card> {
        self.index.get(key).map(|&i| &self.cards[i])
    }

    /// Passive rate of one copy; unknown keys (e.g. from an older dataset)
    /// contribute nothing.
    pub fn cps_of(&self, key: &CardKey) -> f64 {
        self.get(key).map_or(0.0, |c| c.cps)
    }

    /// Map a uniform sample in `[0, 1)` to a card.
    pub fn pick(&self, sample: f64) -> Option<&Card> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let slot = ((sample.clamp(0.0, 1.0) * total as f64).floor() as u64).min(total - 1);
        let idx = self.cumulative.partition_point(|&c| c <= slot);
        self.cards.get(idx)
    }
}
