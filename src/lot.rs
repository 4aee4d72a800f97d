//! In-memory occupancy grid: a fixed floors × spots-per-floor table of
//! owned vehicle records. Allocation order is lexicographic (floor, spot).

use clap::ValueEnum;
use thiserror::Error;

pub const DEFAULT_FLOORS: usize = 5;
pub const DEFAULT_SPOTS_PER_FLOOR: usize = 20;

/// Billing class of a vehicle. The snapshot and transaction log store it
/// as the integer code from `code()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VehicleClass {
    TwoWheeler,
    Standard,
    Heavy,
}

impl VehicleClass {
    pub fn code(self) -> u8 {
        match self {
            VehicleClass::TwoWheeler => 0,
            VehicleClass::Standard => 1,
            VehicleClass::Heavy => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(VehicleClass::TwoWheeler),
            1 => Some(VehicleClass::Standard),
            2 => Some(VehicleClass::Heavy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VehicleClass::TwoWheeler => "two-wheeler",
            VehicleClass::Standard => "standard",
            VehicleClass::Heavy => "heavy",
        }
    }
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A parked vehicle. Exists only while it occupies a spot; its position is
/// the grid index of the spot that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub license: String,
    pub owner: String,
    pub class: VehicleClass,
    /// Entry timestamp, epoch seconds.
    pub entry_time: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("spot ({floor}, {spot}) is out of bounds")]
    OutOfBounds { floor: usize, spot: usize },
    #[error("spot ({floor}, {spot}) is already occupied")]
    Occupied { floor: usize, spot: usize },
}

/// The facility grid. A spot is occupied iff it holds `Some(Vehicle)`;
/// the grid exclusively owns every parked record.
pub struct Lot {
    floors: usize,
    spots_per_floor: usize,
    spots: Vec<Option<Vehicle>>,
}

impl Lot {
    pub fn new(floors: usize, spots_per_floor: usize) -> Self {
        Self {
            floors,
            spots_per_floor,
            spots: (0..floors * spots_per_floor).map(|_| None).collect(),
        }
    }

    pub fn floors(&self) -> usize {
        self.floors
    }

    pub fn spots_per_floor(&self) -> usize {
        self.spots_per_floor
    }

    pub fn capacity(&self) -> usize {
        self.spots.len()
    }

    fn index(&self, floor: usize, spot: usize) -> Option<usize> {
        if floor < self.floors && spot < self.spots_per_floor {
            Some(floor * self.spots_per_floor + spot)
        } else {
            None
        }
    }

    pub fn vehicle_at(&self, floor: usize, spot: usize) -> Option<&Vehicle> {
        self.spots.get(self.index(floor, spot)?)?.as_ref()
    }

    /// First free spot scanning floors upward, then spots within a floor.
    /// Linear index order is exactly lexicographic (floor, spot) order,
    /// which is the allocation policy and must not change.
    pub fn find_nearest_free(&self) -> Option<(usize, usize)> {
        self.spots
            .iter()
            .position(Option::is_none)
            .map(|i| (i / self.spots_per_floor, i % self.spots_per_floor))
    }

    pub fn find_by_license(&self, license: &str) -> Option<(usize, usize)> {
        self.spots
            .iter()
            .position(|s| s.as_ref().is_some_and(|v| v.license == license))
            .map(|i| (i / self.spots_per_floor, i % self.spots_per_floor))
    }

    /// Bind a vehicle to a specific spot. The spot must exist and be free.
    pub fn occupy(&mut self, floor: usize, spot: usize, vehicle: Vehicle) -> Result<(), GridError> {
        let idx = self
            .index(floor, spot)
            .ok_or(GridError::OutOfBounds { floor, spot })?;
        if self.spots[idx].is_some() {
            return Err(GridError::Occupied { floor, spot });
        }
        self.spots[idx] = Some(vehicle);
        Ok(())
    }

    /// Clear a spot and hand back the record it owned, if any.
    pub fn release(&mut self, floor: usize, spot: usize) -> Option<Vehicle> {
        let idx = self.index(floor, spot)?;
        self.spots[idx].take()
    }

    pub fn occupied_count(&self) -> usize {
        self.spots.iter().filter(|s| s.is_some()).count()
    }

    pub fn occupied_on_floor(&self, floor: usize) -> usize {
        let start = floor * self.spots_per_floor;
        self.spots
            .get(start..start + self.spots_per_floor)
            .map(|row| row.iter().filter(|s| s.is_some()).count())
            .unwrap_or(0)
    }

    /// Occupied spots in (floor, spot) order.
    pub fn iter_occupied(&self) -> impl Iterator<Item = (usize, usize, &Vehicle)> {
        self.spots.iter().enumerate().filter_map(|(i, s)| {
            s.as_ref()
                .map(|v| (i / self.spots_per_floor, i % self.spots_per_floor, v))
        })
    }
}
