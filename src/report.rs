//! Derived statistics over the grid and the transaction log: occupancy
//! rates, revenue totals, peak entry hour. Pure computations; rendering
//! stays at the CLI boundary.

use crate::lot::Lot;
use crate::store::Transaction;
use chrono::{Local, NaiveDate, TimeZone, Timelike};

pub struct OccupancyReport {
    /// Occupied count per floor, floor 0 first.
    pub per_floor: Vec<usize>,
    pub spots_per_floor: usize,
    pub total_occupied: usize,
    pub capacity: usize,
}

pub fn occupancy(lot: &Lot) -> OccupancyReport {
    OccupancyReport {
        per_floor: (0..lot.floors())
            .map(|floor| lot.occupied_on_floor(floor))
            .collect(),
        spots_per_floor: lot.spots_per_floor(),
        total_occupied: lot.occupied_count(),
        capacity: lot.capacity(),
    }
}

pub struct RevenueReport {
    /// Fees from visits whose exit fell on the given calendar date.
    pub today: f64,
    /// Fees from every recorded visit.
    pub total: f64,
}

pub fn revenue(txns: &[Transaction], today: NaiveDate) -> RevenueReport {
    let mut report = RevenueReport {
        today: 0.0,
        total: 0.0,
    };
    for txn in txns {
        report.total += txn.fee;
        if local_date(txn.exit_time) == Some(today) {
            report.today += txn.fee;
        }
    }
    report
}

pub struct PeakHourReport {
    /// Entry count per local hour of day.
    pub histogram: [u32; 24],
    /// Busiest hour and its count; `None` when there is no data at all.
    pub peak: Option<(usize, u32)>,
}

/// Histogram of entry hours merging two sources: every historical
/// transaction, and every currently parked vehicle not yet in the log.
pub fn peak_entry_hour(txns: &[Transaction], lot: &Lot) -> PeakHourReport {
    let mut histogram = [0u32; 24];
    for txn in txns {
        if let Some(hour) = local_hour(txn.entry_time) {
            histogram[hour] += 1;
        }
    }
    for (_, _, vehicle) in lot.iter_occupied() {
        if let Some(hour) = local_hour(vehicle.entry_time) {
            histogram[hour] += 1;
        }
    }

    // strict greater-than keeps the lowest hour on ties
    let mut peak_hour = 0usize;
    let mut peak_count = histogram[0];
    for (hour, &count) in histogram.iter().enumerate().skip(1) {
        if count > peak_count {
            peak_hour = hour;
            peak_count = count;
        }
    }
    PeakHourReport {
        histogram,
        peak: (peak_count > 0).then_some((peak_hour, peak_count)),
    }
}

fn local_date(epoch: i64) -> Option<NaiveDate> {
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt| dt.date_naive())
}

fn local_hour(epoch: i64) -> Option<usize> {
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt| dt.hour() as usize)
}
