//! The accessory shop catalog.
//!
//! Catalog entries are immutable, process-wide data: the set of cosmetic
//! accessories a character can buy, each priced in points and assigned to
//! an equip slot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate accessory id: {0}")]
    DuplicateId(String),
}

/// Equip-exclusivity category. At most one accessory per slot can be
/// equipped at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Head,
    Face,
    Body,
    Weapon,
    Companion,
    Aura,
    Special,
}

/// A purchasable accessory definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessory {
    /// Unique key within the catalog.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Price in points.
    pub cost: u64,

    /// Equip slot.
    pub slot: Slot,

    /// Minimum lifetime points required before this can be purchased,
    /// independent of the cost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_threshold: Option<u64>,
}

impl Accessory {
    pub fn new(id: impl Into<String>, name: impl Into<String>, cost: u64, slot: Slot) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost,
            slot,
            unlock_threshold: None,
        }
    }

    pub fn with_unlock_threshold(mut self, threshold: u64) -> Self {
        self.unlock_threshold = Some(threshold);
        self
    }
}

/// An immutable accessory catalog with unique ids.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Accessory>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids.
    pub fn new(entries: Vec<Accessory>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// Look up an accessory by id.
    pub fn get(&self, id: &str) -> Option<&Accessory> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[Accessory] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static::lazy_static! {
    /// The default shop catalog.
    pub static ref DEFAULT_CATALOG: Catalog = Catalog::new(vec![
        Accessory::new("hat_basic", "Basic Hat", 20, Slot::Head),
        Accessory::new("hat_wizard", "Wizard Hat", 50, Slot::Head),
        Accessory::new("glasses_nerd", "Nerd Glasses", 40, Slot::Face),
        Accessory::new("cape_red", "Red Cape", 60, Slot::Body),
        Accessory::new("sword_wooden", "Wooden Sword", 35, Slot::Weapon),
        Accessory::new("pet_cat", "Tiny Cat Companion", 80, Slot::Companion),
        Accessory::new("aura_sparkle", "Sparkle Aura", 120, Slot::Aura)
            .with_unlock_threshold(200),
        Accessory::new("crown_gold", "Golden Crown", 250, Slot::Head)
            .with_unlock_threshold(500),
    ])
    .expect("default catalog has duplicate ids");
}
