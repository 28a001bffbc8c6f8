//! Purchase and equip operations over a ledger and the catalog.
//!
//! Every operation validates fully before touching the ledger, so a
//! failed operation never leaves partial state behind.

use crate::catalog::Catalog;
use crate::ledger::UserLedger;
use thiserror::Error;

/// Business-rule failures from inventory operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("accessory not found: {0}")]
    UnknownAccessory(String),

    #[error("accessory already owned: {0}")]
    AlreadyOwned(String),

    #[error("you do not own this accessory: {0}")]
    NotOwned(String),

    #[error("accessory is not equipped: {0}")]
    NotEquipped(String),

    #[error("not enough points: need {cost}, have {points}")]
    InsufficientPoints { cost: u64, points: u64 },

    #[error("accessory locked: requires {required} lifetime points, have {lifetime}")]
    LockedAccessory { required: u64, lifetime: u64 },
}

/// Buy an accessory: debit its cost and add it to the owned set.
pub fn purchase(
    ledger: &mut UserLedger,
    catalog: &Catalog,
    accessory_id: &str,
) -> Result<(), InventoryError> {
    let entry = catalog
        .get(accessory_id)
        .ok_or_else(|| InventoryError::UnknownAccessory(accessory_id.to_string()))?;

    if ledger.owned_accessories.contains(accessory_id) {
        return Err(InventoryError::AlreadyOwned(accessory_id.to_string()));
    }

    // Locked wins over unaffordable: the threshold gates the purchase at all
    if let Some(required) = entry.unlock_threshold {
        if ledger.lifetime_points < required {
            return Err(InventoryError::LockedAccessory {
                required,
                lifetime: ledger.lifetime_points,
            });
        }
    }

    if ledger.points < entry.cost {
        return Err(InventoryError::InsufficientPoints {
            cost: entry.cost,
            points: ledger.points,
        });
    }

    ledger.points -= entry.cost;
    ledger.owned_accessories.insert(entry.id.clone());
    Ok(())
}

/// Equip an owned accessory, evicting whatever else occupies its slot.
///
/// Re-equipping an already-equipped accessory leaves the ledger unchanged.
pub fn equip(
    ledger: &mut UserLedger,
    catalog: &Catalog,
    accessory_id: &str,
) -> Result<(), InventoryError> {
    // Ownership first: an id that is neither owned nor in the catalog is a
    // NotOwned failure, not an UnknownAccessory one.
    if !ledger.owned_accessories.contains(accessory_id) {
        return Err(InventoryError::NotOwned(accessory_id.to_string()));
    }

    let entry = catalog
        .get(accessory_id)
        .ok_or_else(|| InventoryError::UnknownAccessory(accessory_id.to_string()))?;

    let evicted: Vec<String> = ledger
        .equipped_accessories
        .iter()
        .filter(|id| id.as_str() != accessory_id)
        .filter(|id| {
            catalog
                .get(id)
                .map(|other| other.slot == entry.slot)
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    for id in evicted {
        ledger.equipped_accessories.remove(&id);
    }

    ledger.equipped_accessories.insert(accessory_id.to_string());
    Ok(())
}

/// Remove an accessory from the equipped set.
pub fn unequip(ledger: &mut UserLedger, accessory_id: &str) -> Result<(), InventoryError> {
    if !ledger.equipped_accessories.remove(accessory_id) {
        return Err(InventoryError::NotEquipped(accessory_id.to_string()));
    }
    Ok(())
}
