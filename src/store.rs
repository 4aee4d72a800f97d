//! Flat-file persistence: a wholesale-rewritten occupancy snapshot plus an
//! append-only transaction log, both CSV in a dedicated data directory.

use crate::lot::{Lot, Vehicle, VehicleClass};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

pub const STATE_FILE: &str = "parking_state.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

const STATE_HEADER: [&str; 6] = ["floor", "spot", "license", "owner", "type", "entryTime"];
const TXN_HEADER: [&str; 6] = [
    "license",
    "type",
    "entryTime",
    "exitTime",
    "durationMin",
    "fee",
];

/// One completed park-then-leave visit, as recorded in the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub license: String,
    pub class: VehicleClass,
    pub entry_time: i64,
    pub exit_time: i64,
    pub duration_min: i64,
    pub fee: f64,
}

// ── Wire rows ───────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StateRow {
    floor: usize,
    spot: usize,
    license: String,
    owner: String,
    #[serde(rename = "type")]
    class: u8,
    #[serde(rename = "entryTime")]
    entry_time: i64,
}

#[derive(Debug, Deserialize)]
struct TxnRow {
    license: String,
    #[serde(rename = "type")]
    class: u8,
    #[serde(rename = "entryTime")]
    entry_time: i64,
    #[serde(rename = "exitTime")]
    exit_time: i64,
    #[serde(rename = "durationMin")]
    duration_min: i64,
    fee: f64,
}

// ── Store ───────────────────────────────────────────────────

pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory {}", self.data_dir.display())
        })
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    pub fn transactions_path(&self) -> PathBuf {
        self.data_dir.join(TRANSACTIONS_FILE)
    }

    /// Rewrite the snapshot wholesale from the current grid, one row per
    /// occupied spot in (floor, spot) order.
    pub fn save_snapshot(&self, lot: &Lot) -> Result<()> {
        let path = self.state_path();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .with_context(|| format!("Failed to open {} for writing", path.display()))?;
        writer
            .write_record(STATE_HEADER)
            .context("Failed to write snapshot header")?;
        for (floor, spot, v) in lot.iter_occupied() {
            writer
                .serialize(StateRow {
                    floor,
                    spot,
                    license: v.license.clone(),
                    owner: v.owner.clone(),
                    class: v.class.code(),
                    entry_time: v.entry_time,
                })
                .context("Failed to write snapshot row")?;
        }
        writer.flush().context("Failed to flush snapshot")?;
        Ok(())
    }

    /// Rehydrate the grid from the snapshot. A missing file is an empty
    /// lot, not an error. Rows that cannot be rebound without breaking a
    /// grid invariant are skipped, never fatal.
    pub fn load_snapshot(&self, lot: &mut Lot, verbose: u8) -> Result<usize> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(0);
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut restored = 0usize;
        for row in reader.deserialize::<StateRow>() {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    if verbose > 0 {
                        eprintln!("skipping malformed snapshot row: {err}");
                    }
                    continue;
                }
            };
            let Some(class) = VehicleClass::from_code(row.class) else {
                if verbose > 0 {
                    eprintln!("skipping snapshot row with unknown class code {}", row.class);
                }
                continue;
            };
            if lot.find_by_license(&row.license).is_some() {
                if verbose > 0 {
                    eprintln!("skipping duplicate snapshot row for {}", row.license);
                }
                continue;
            }
            let vehicle = Vehicle {
                license: row.license,
                owner: row.owner,
                class,
                entry_time: row.entry_time,
            };
            match lot.occupy(row.floor, row.spot, vehicle) {
                Ok(()) => restored += 1,
                Err(err) => {
                    if verbose > 0 {
                        eprintln!("skipping snapshot row: {err}");
                    }
                }
            }
        }
        Ok(restored)
    }

    /// Append one visit to the transaction log. The header is written only
    /// when the file is created (or empty); prior rows are never touched.
    pub fn append_transaction(&self, txn: &Transaction) -> Result<()> {
        let path = self.transactions_path();
        let needs_header = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {} for append", path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer
                .write_record(TXN_HEADER)
                .context("Failed to write transaction header")?;
        }
        writer
            .write_record(&[
                txn.license.clone(),
                txn.class.code().to_string(),
                txn.entry_time.to_string(),
                txn.exit_time.to_string(),
                txn.duration_min.to_string(),
                format!("{:.2}", txn.fee),
            ])
            .context("Failed to append transaction")?;
        writer.flush().context("Failed to flush transaction log")?;
        Ok(())
    }

    /// Every recorded visit, oldest first. Missing log means no visits.
    pub fn read_transactions(&self, verbose: u8) -> Result<Vec<Transaction>> {
        let path = self.transactions_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut txns = Vec::new();
        for row in reader.deserialize::<TxnRow>() {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    if verbose > 0 {
                        eprintln!("skipping malformed transaction row: {err}");
                    }
                    continue;
                }
            };
            let Some(class) = VehicleClass::from_code(row.class) else {
                if verbose > 0 {
                    eprintln!("skipping transaction row with unknown class code {}", row.class);
                }
                continue;
            };
            txns.push(Transaction {
                license: row.license,
                class,
                entry_time: row.entry_time,
                exit_time: row.exit_time,
                duration_min: row.duration_min,
                fee: row.fee,
            });
        }
        Ok(txns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(license: &str, class: VehicleClass, entry_time: i64) -> Vehicle {
        Vehicle {
            license: license.to_string(),
            owner: format!("owner of {license}"),
            class,
            entry_time,
        }
    }

    fn occupied_tuples(lot: &Lot) -> Vec<(usize, usize, String, String, u8, i64)> {
        lot.iter_occupied()
            .map(|(f, s, v)| {
                (
                    f,
                    s,
                    v.license.clone(),
                    v.owner.clone(),
                    v.class.code(),
                    v.entry_time,
                )
            })
            .collect()
    }

    #[test]
    fn snapshot_round_trip_reproduces_grid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path());

        let mut lot = Lot::new(3, 4);
        lot.occupy(0, 0, vehicle("AA-1", VehicleClass::TwoWheeler, 1_700_000_100))
            .unwrap();
        lot.occupy(1, 2, vehicle("BB-2", VehicleClass::Standard, 1_700_000_200))
            .unwrap();
        lot.occupy(2, 3, vehicle("CC-3", VehicleClass::Heavy, 1_700_000_300))
            .unwrap();
        store.save_snapshot(&lot).unwrap();

        let mut reloaded = Lot::new(3, 4);
        let restored = store.load_snapshot(&mut reloaded, 0).unwrap();
        assert_eq!(restored, 3);
        assert_eq!(occupied_tuples(&lot), occupied_tuples(&reloaded));
    }

    #[test]
    fn empty_lot_snapshot_keeps_the_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path());
        store.save_snapshot(&Lot::new(2, 2)).unwrap();

        let content = fs::read_to_string(store.state_path()).unwrap();
        assert_eq!(content.trim_end(), "floor,spot,license,owner,type,entryTime");
    }

    #[test]
    fn missing_snapshot_means_empty_lot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path());
        let mut lot = Lot::new(2, 2);
        assert_eq!(store.load_snapshot(&mut lot, 0).unwrap(), 0);
        assert_eq!(lot.occupied_count(), 0);
    }

    #[test]
    fn corrupt_snapshot_rows_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path());
        fs::write(
            store.state_path(),
            "floor,spot,license,owner,type,entryTime\n\
             0,0,AA-1,Asha,9,1700000000\n\
             7,0,BB-2,Ben,1,1700000000\n\
             0,1,CC-3,Cleo,2,1700000000\n",
        )
        .unwrap();

        let mut lot = Lot::new(2, 2);
        let restored = store.load_snapshot(&mut lot, 0).unwrap();
        assert_eq!(restored, 1);
        assert_eq!(lot.find_by_license("CC-3"), Some((0, 1)));
        assert_eq!(lot.find_by_license("AA-1"), None);
        assert_eq!(lot.find_by_license("BB-2"), None);
    }

    #[test]
    fn transaction_log_gets_exactly_one_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path());
        let txn = Transaction {
            license: "AA-1".to_string(),
            class: VehicleClass::TwoWheeler,
            entry_time: 1_700_000_000,
            exit_time: 1_700_005_400,
            duration_min: 90,
            fee: 30.0,
        };
        store.append_transaction(&txn).unwrap();
        store.append_transaction(&txn).unwrap();

        let content = fs::read_to_string(store.transactions_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "license,type,entryTime,exitTime,durationMin,fee");
        assert_eq!(lines[1], "AA-1,0,1700000000,1700005400,90,30.00");
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn fee_column_always_has_two_decimals() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path());
        let txn = Transaction {
            license: "BB-2".to_string(),
            class: VehicleClass::Heavy,
            entry_time: 1_700_000_000,
            exit_time: 1_700_000_060,
            duration_min: 1,
            fee: 60.0,
        };
        store.append_transaction(&txn).unwrap();
        let content = fs::read_to_string(store.transactions_path()).unwrap();
        assert!(content.contains(",60.00"), "{content}");
    }

    #[test]
    fn read_transactions_round_trips_appended_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path());
        let txn = Transaction {
            license: "AA-1".to_string(),
            class: VehicleClass::Standard,
            entry_time: 1_700_000_000,
            exit_time: 1_700_003_600,
            duration_min: 60,
            fee: 40.0,
        };
        store.append_transaction(&txn).unwrap();

        let txns = store.read_transactions(0).unwrap();
        assert_eq!(txns, vec![txn]);
    }

    #[test]
    fn missing_transaction_log_reads_as_no_visits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path());
        assert!(store.read_transactions(0).unwrap().is_empty());
    }
}
