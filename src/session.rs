//! Entry, exit and search orchestration: validates input, drives the grid
//! and fee model, and persists through the store. Persistence failures do
//! not undo a completed operation; they surface as warnings.

use crate::fees;
use crate::lot::{Lot, Vehicle, VehicleClass};
use crate::store::{Store, Transaction};
use chrono::{DateTime, Local};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{field} must not be empty")]
    Validation { field: &'static str },
    /// Floor and spot carry the 1-based values shown to the operator.
    #[error("vehicle {license} is already parked at floor {floor}, spot {spot}")]
    DuplicateVehicle {
        license: String,
        floor: usize,
        spot: usize,
    },
    #[error("parking full: no free spot available")]
    LotFull,
    #[error("vehicle {license} is not parked here")]
    NotFound { license: String },
}

#[derive(Debug)]
pub struct EntryTicket {
    pub license: String,
    pub owner: String,
    pub class: VehicleClass,
    pub floor: usize,
    pub spot: usize,
    pub entry_time: i64,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct ExitReceipt {
    pub license: String,
    pub owner: String,
    pub class: VehicleClass,
    pub floor: usize,
    pub spot: usize,
    pub entry_time: i64,
    pub exit_time: i64,
    pub duration_min: i64,
    pub fee: f64,
    pub warnings: Vec<String>,
}

pub struct ParkedVehicle<'a> {
    pub floor: usize,
    pub spot: usize,
    pub vehicle: &'a Vehicle,
}

/// Park a vehicle at the nearest free spot and persist the new state.
pub fn check_in(
    lot: &mut Lot,
    store: &Store,
    class: VehicleClass,
    license: &str,
    owner: &str,
    now: DateTime<Local>,
) -> Result<EntryTicket, SessionError> {
    let license = license.trim();
    let owner = owner.trim();
    if license.is_empty() {
        return Err(SessionError::Validation { field: "license" });
    }
    if owner.is_empty() {
        return Err(SessionError::Validation { field: "owner" });
    }
    if let Some((floor, spot)) = lot.find_by_license(license) {
        return Err(SessionError::DuplicateVehicle {
            license: license.to_string(),
            floor: floor + 1,
            spot: spot + 1,
        });
    }

    let (floor, spot) = lot.find_nearest_free().ok_or(SessionError::LotFull)?;
    let entry_time = now.timestamp();
    let vehicle = Vehicle {
        license: license.to_string(),
        owner: owner.to_string(),
        class,
        entry_time,
    };
    // the spot was just reported free, so this cannot reject
    lot.occupy(floor, spot, vehicle)
        .map_err(|_| SessionError::LotFull)?;

    let mut warnings = Vec::new();
    if let Err(err) = store.save_snapshot(lot) {
        warnings.push(format!("failed to persist parking state: {err:#}"));
    }
    Ok(EntryTicket {
        license: license.to_string(),
        owner: owner.to_string(),
        class,
        floor,
        spot,
        entry_time,
        warnings,
    })
}

/// Bill a parked vehicle, record the visit, free its spot and persist.
/// Duration is elapsed whole minutes, never below one chargeable minute.
pub fn check_out(
    lot: &mut Lot,
    store: &Store,
    license: &str,
    now: DateTime<Local>,
) -> Result<ExitReceipt, SessionError> {
    let license = license.trim();
    if license.is_empty() {
        return Err(SessionError::Validation { field: "license" });
    }
    let (floor, spot) = lot
        .find_by_license(license)
        .ok_or_else(|| SessionError::NotFound {
            license: license.to_string(),
        })?;
    let vehicle = lot
        .release(floor, spot)
        .ok_or_else(|| SessionError::NotFound {
            license: license.to_string(),
        })?;

    let exit_time = now.timestamp();
    let duration_min = ((exit_time - vehicle.entry_time) / 60).max(1);
    let fee = fees::compute_fee(vehicle.class, duration_min);

    let mut warnings = Vec::new();
    if let Err(err) = store.append_transaction(&Transaction {
        license: vehicle.license.clone(),
        class: vehicle.class,
        entry_time: vehicle.entry_time,
        exit_time,
        duration_min,
        fee,
    }) {
        warnings.push(format!("failed to record transaction: {err:#}"));
    }
    if let Err(err) = store.save_snapshot(lot) {
        warnings.push(format!("failed to persist parking state: {err:#}"));
    }

    Ok(ExitReceipt {
        license: vehicle.license,
        owner: vehicle.owner,
        class: vehicle.class,
        floor,
        spot,
        entry_time: vehicle.entry_time,
        exit_time,
        duration_min,
        fee,
        warnings,
    })
}

/// Read-only lookup. A miss is an ordinary outcome, not an error.
pub fn find<'a>(lot: &'a Lot, license: &str) -> Option<ParkedVehicle<'a>> {
    let license = license.trim();
    let (floor, spot) = lot.find_by_license(license)?;
    lot.vehicle_at(floor, spot).map(|vehicle| ParkedVehicle {
        floor,
        spot,
        vehicle,
    })
}
