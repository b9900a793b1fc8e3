//! Snapshot save/load.
//!
//! ## Versioning
//!
//! - `SAVE_VERSION`: current snapshot format. Bump when fields are added.
//! - `MIN_COMPATIBLE_VERSION`: oldest format that still loads. Only bump it
//!   for breaking changes (a field removed or its meaning changed); purely
//!   additive changes leave it alone.
//!
//! Snapshots at or above `MIN_COMPATIBLE_VERSION` load with missing fields
//! filled from their defaults. Anything else is discarded and the game
//! starts fresh.
//!
//! Version 2 added the overheat window and the pending card reveal.
//!
//! Short-lived state (golden rose, burst and chill counters) is not saved.
//! Frenzy, overheat and maintenance windows are, and expire normally on the
//! first advance after reload. A pack that was paid for is saved with its
//! card, so the reveal finishes after reload.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::cards::CardKey;
use super::catalog::{AchievementId, AutomationId, Tuning, UpgradeId};
use super::state::{EconomyState, PendingDraw, Stats, Transients, Window};
use crate::error::StoreError;

/// Snapshot format version. Bump when fields are added.
pub const SAVE_VERSION: u32 = 2;

/// Oldest snapshot format that still loads.
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// Key under which every store keeps the snapshot.
pub const STORAGE_KEY: &str = "wither_clicker_state_v1";

/// Browsers reject cookies much larger than this.
pub const COOKIE_LIMIT: usize = 4096;

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
const COOKIE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Serialize, Deserialize)]
struct SaveData {
    version: u32,
    game: GameSave,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct GameSave {
    currency: f64,
    click_power: f64,
    upgrades: BTreeMap<UpgradeId, u32>,
    automations: BTreeMap<AutomationId, u32>,
    cards: BTreeMap<CardKey, u32>,
    heat: f64,
    achievements: BTreeSet<AchievementId>,
    prestige_level: u32,
    stats: Stats,
    frenzy: Window,
    maintenance: BTreeMap<AutomationId, u64>,
    overheat: Window,
    draw: Option<PendingDraw>,
}

fn extract_save(state: &EconomyState) -> SaveData {
    SaveData {
        version: SAVE_VERSION,
        game: GameSave {
            currency: state.currency,
            click_power: state.click_power,
            upgrades: state.upgrades.clone(),
            automations: state.automations.clone(),
            cards: state.cards.clone(),
            heat: state.heat,
            achievements: state.achievements.clone(),
            prestige_level: state.prestige_level,
            stats: state.stats.clone(),
            frenzy: state.transients.frenzy,
            maintenance: state.transients.maintenance.clone(),
            overheat: state.transients.overheat,
            draw: state.transients.draw.clone(),
        },
    }
}

fn apply_save(save: GameSave, tuning: &Tuning) -> EconomyState {
    let mut state = EconomyState {
        currency: save.currency,
        click_power: save.click_power,
        upgrades: save.upgrades,
        automations: save.automations,
        cards: save.cards,
        heat: save.heat,
        prestige_level: save.prestige_level,
        stats: save.stats,
        achievements: save.achievements,
        transients: Transients {
            frenzy: save.frenzy,
            maintenance: save.maintenance,
            overheat: save.overheat,
            draw: save.draw,
            ..Transients::default()
        },
    };
    state.sanitize(tuning);
    state
}

/// Serialize the persistable part of `state`.
pub fn encode(state: &EconomyState) -> Result<String, StoreError> {
    serde_json::to_string(&extract_save(state)).map_err(StoreError::Serialize)
}

/// Parse a snapshot, migrating older compatible versions.
pub fn decode(json: &str, tuning: &Tuning) -> Result<EconomyState, StoreError> {
    let data: SaveData = serde_json::from_str(json).map_err(StoreError::Parse)?;
    if data.version < MIN_COMPATIBLE_VERSION {
        return Err(StoreError::Incompatible {
            saved: data.version,
            min: MIN_COMPATIBLE_VERSION,
        });
    }
    if data.version < SAVE_VERSION {
        log::info!(
            "migrating snapshot from version {} to {SAVE_VERSION}",
            data.version
        );
    }
    Ok(apply_save(data.game, tuning))
}

/// Somewhere a snapshot string can live.
pub trait SnapshotStore {
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&mut self, json: &str) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// In-process store for native hosts and tests. An optional size limit
/// mimics the cookie store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    data: Option<String>,
    limit: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: None,
            limit: Some(limit),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.data.clone())
    }

    fn write(&mut self, json: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.limit {
            if json.len() > limit {
                return Err(StoreError::TooLarge {
                    len: json.len(),
                    limit,
                });
            }
        }
        self.data = Some(json.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.data = None;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
fn js_err(e: impl std::fmt::Debug) -> StoreError {
    StoreError::Backend(format!("{e:?}"))
}

/// `window.localStorage`.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .ok_or(StoreError::Unavailable)?
            .local_storage()
            .map_err(js_err)?
            .ok_or(StoreError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new(STORAGE_KEY)
    }
}

#[cfg(target_arch = "wasm32")]
impl SnapshotStore for LocalStorageStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Self::storage()?.get_item(&self.key).map_err(js_err)
    }

    fn write(&mut self, json: &str) -> Result<(), StoreError> {
        Self::storage()?.set_item(&self.key, json).map_err(js_err)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        Self::storage()?.remove_item(&self.key).map_err(js_err)
    }
}

/// `document.cookie`, URI-encoded, one year expiry, at most [`COOKIE_LIMIT`]
/// bytes.
#[cfg(target_arch = "wasm32")]
pub struct CookieStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl CookieStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn document() -> Result<web_sys::Document, StoreError> {
        web_sys::window()
            .and_then(|w| w.document())
            .ok_or(StoreError::Unavailable)
    }

    fn cookie_jar() -> Result<String, StoreError> {
        let doc = Self::document()?;
        let raw = js_sys::Reflect::get(&doc, &"cookie".into()).map_err(js_err)?;
        Ok(raw.as_string().unwrap_or_default())
    }

    fn set_cookie(line: &str) -> Result<(), StoreError> {
        let doc = Self::document()?;
        js_sys::Reflect::set(&doc, &"cookie".into(), &line.into()).map_err(js_err)?;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for CookieStore {
    fn default() -> Self {
        Self::new(STORAGE_KEY)
    }
}

#[cfg(target_arch = "wasm32")]
impl SnapshotStore for CookieStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        let jar = Self::cookie_jar()?;
        let prefix = format!("{}=", self.key);
        let Some(encoded) = jar
            .split(';')
            .map(str::trim)
            .find_map(|pair| pair.strip_prefix(prefix.as_str()))
        else {
            return Ok(None);
        };
        let decoded = js_sys::decode_uri_component(encoded).map_err(js_err)?;
        Ok(Some(String::from(decoded)))
    }

    fn write(&mut self, json: &str) -> Result<(), StoreError> {
        let encoded = String::from(js_sys::encode_uri_component(json));
        if encoded.len() > COOKIE_LIMIT {
            return Err(StoreError::TooLarge {
                len: encoded.len(),
                limit: COOKIE_LIMIT,
            });
        }
        Self::set_cookie(&format!(
            "{}={encoded}; max-age={COOKIE_MAX_AGE_SECS}; path=/; SameSite=Lax",
            self.key
        ))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        Self::set_cookie(&format!("{}=; max-age=0; path=/", self.key))
    }
}

/// Read the snapshot from the first store that has a usable one. Corrupt or
/// incompatible data is removed from its store and skipped.
pub fn load_snapshot(
    stores: &mut [&mut dyn SnapshotStore],
    tuning: &Tuning,
) -> Option<EconomyState> {
    for store in stores.iter_mut() {
        let json = match store.read() {
            Ok(Some(json)) => json,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("snapshot read failed: {e}");
                continue;
            }
        };
        match decode(&json, tuning) {
            Ok(state) => return Some(state),
            Err(e) => {
                log::warn!("discarding snapshot: {e}");
                if let Err(e) = store.clear() {
                    log::warn!("could not remove bad snapshot: {e}");
                }
            }
        }
    }
    None
}

/// Write `state` to every store. Failures are logged and skipped; returns
/// whether at least one store took the snapshot.
pub fn save_snapshot(state: &EconomyState, stores: &mut [&mut dyn SnapshotStore]) -> bool {
    let json = match encode(state) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("snapshot not saved: {e}");
            return false;
        }
    };
    let mut saved = false;
    for store in stores.iter_mut() {
        match store.write(&json) {
            Ok(()) => saved = true,
            Err(e) => log::warn!("snapshot write failed: {e}"),
        }
    }
    saved
}
