mod config;
mod fees;
mod lot;
mod report;
mod session;
mod store;

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use config::Config;
use lot::{Lot, VehicleClass};
use session::{EntryTicket, ExitReceipt};
use store::{Store, Transaction};

#[derive(Parser)]
#[command(
    name = "parkctl",
    version,
    about = "Parking facility operator - allocation, billing, durable occupancy",
    long_about = "Operates a fixed-capacity multi-floor parking facility: assigns the nearest free spot on entry, bills tiered hourly fees on exit, and keeps occupancy plus the transaction audit trail in flat CSV files."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory override (defaults to the configured one, then ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Park a vehicle at the nearest free spot
    Park {
        /// License plate (unique while parked)
        license: String,

        /// Billing class
        #[arg(short, long, value_enum)]
        class: VehicleClass,

        /// Owner name or contact
        #[arg(short, long)]
        owner: String,
    },

    /// Check a vehicle out: compute the fee, record the visit, free the spot
    Exit {
        /// License plate of the parked vehicle
        license: String,
    },

    /// Locate a parked vehicle
    Find {
        /// License plate to look up
        license: String,
    },

    /// Facility statistics
    Report {
        #[command(subcommand)]
        kind: ReportCommands,
    },

    /// Show the effective configuration
    Config {
        /// Create the config file with defaults if it does not exist
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Occupied spots per floor and overall
    Occupancy,

    /// Revenue today and all-time, from the transaction log
    Revenue,

    /// Busiest entry hour across history and currently parked vehicles
    PeakHour,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load()?;
    if !cfg.display.colors {
        colored::control::set_override(false);
    }

    let Cli {
        command,
        data_dir,
        verbose,
    } = cli;
    let data_dir = data_dir.unwrap_or_else(|| cfg.storage.data_dir.clone());

    match command {
        Commands::Park {
            license,
            class,
            owner,
        } => {
            let (store, mut lot) = open_facility(&cfg, data_dir, verbose)?;
            let ticket = session::check_in(&mut lot, &store, class, &license, &owner, Local::now())?;
            print_ticket(&ticket);
            report_warnings(&ticket.warnings);
        }

        Commands::Exit { license } => {
            let (store, mut lot) = open_facility(&cfg, data_dir, verbose)?;
            let receipt = session::check_out(&mut lot, &store, &license, Local::now())?;
            print_receipt(&receipt);
            report_warnings(&receipt.warnings);
        }

        Commands::Find { license } => {
            let (_store, lot) = open_facility(&cfg, data_dir, verbose)?;
            match session::find(&lot, &license) {
                Some(found) => println!(
                    "Found: floor {}, spot {} - {} ({}), owner {}, entered {}",
                    found.floor + 1,
                    found.spot + 1,
                    found.vehicle.license,
                    found.vehicle.class,
                    found.vehicle.owner,
                    fmt_ts(found.vehicle.entry_time)
                ),
                None => println!("Vehicle {} is not parked here.", license.trim()),
            }
        }

        Commands::Report { kind } => {
            let (store, lot) = open_facility(&cfg, data_dir, verbose)?;
            match kind {
                ReportCommands::Occupancy => print_occupancy(&lot),
                ReportCommands::Revenue => {
                    let txns = store.read_transactions(verbose)?;
                    print_revenue(&txns);
                }
                ReportCommands::PeakHour => {
                    let txns = store.read_transactions(verbose)?;
                    print_peak_hour(&txns, &lot);
                }
            }
        }

        Commands::Config { init } => {
            if init {
                config::init_config()?;
            } else {
                config::show_config()?;
            }
        }
    }

    Ok(())
}

/// Open the data directory and rehydrate the grid from the snapshot.
fn open_facility(cfg: &Config, data_dir: PathBuf, verbose: u8) -> Result<(Store, Lot)> {
    let store = Store::new(data_dir);
    store.ensure_dir()?;
    let mut lot = Lot::new(cfg.grid.floors, cfg.grid.spots_per_floor);
    let restored = store.load_snapshot(&mut lot, verbose)?;
    if verbose > 0 {
        eprintln!(
            "restored {restored} parked vehicle(s) from {}",
            store.state_path().display()
        );
    }
    Ok((store, lot))
}

// ── Rendering ───────────────────────────────────────────────

fn fmt_ts(epoch: i64) -> String {
    match Local.timestamp_opt(epoch, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("@{epoch}"),
    }
}

fn report_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning.yellow());
    }
}

fn print_ticket(ticket: &EntryTicket) {
    println!("{}", "=== Entry Ticket ===".bold());
    println!("License: {}", ticket.license);
    println!("Class:   {}", ticket.class);
    println!("Owner:   {}", ticket.owner);
    println!("Assigned floor {}, spot {}", ticket.floor + 1, ticket.spot + 1);
    println!("Entry time: {}", fmt_ts(ticket.entry_time));
}

fn print_receipt(receipt: &ExitReceipt) {
    println!("{}", "--- Receipt ---".bold());
    println!("License:  {}", receipt.license);
    println!("Class:    {}", receipt.class);
    println!("Owner:    {}", receipt.owner);
    println!(
        "Spot:     floor {}, spot {}",
        receipt.floor + 1,
        receipt.spot + 1
    );
    println!("Entry:    {}", fmt_ts(receipt.entry_time));
    println!("Exit:     {}", fmt_ts(receipt.exit_time));
    println!("Duration: {} min", receipt.duration_min);
    println!("Fee:      {}", format!("{:.2}", receipt.fee).green().bold());
}

fn print_occupancy(lot: &Lot) {
    let rep = report::occupancy(lot);
    println!("{}", "=== Occupancy ===".bold());
    for (floor, &occupied) in rep.per_floor.iter().enumerate() {
        println!(
            "Floor {}: {}/{} ({:.1}%)",
            floor + 1,
            occupied,
            rep.spots_per_floor,
            pct(occupied, rep.spots_per_floor)
        );
    }
    println!(
        "Overall: {}/{} ({:.1}%)",
        rep.total_occupied,
        rep.capacity,
        pct(rep.total_occupied, rep.capacity)
    );
}

fn pct(occupied: usize, capacity: usize) -> f64 {
    if capacity == 0 {
        0.0
    } else {
        100.0 * occupied as f64 / capacity as f64
    }
}

fn print_revenue(txns: &[Transaction]) {
    if txns.is_empty() {
        println!("No transactions yet.");
        return;
    }
    let rep = report::revenue(txns, Local::now().date_naive());
    println!("{}", "=== Revenue ===".bold());
    println!("Today: {:.2}", rep.today);
    println!("Total: {:.2}", rep.total);
}

fn print_peak_hour(txns: &[Transaction], lot: &Lot) {
    let rep = report::peak_entry_hour(txns, lot);
    println!("{}", "=== Peak Entry Hour ===".bold());
    match rep.peak {
        Some((hour, count)) => {
            println!(
                "Busiest entry hour: {:02}:00-{:02}:00 with {} entries (historical + current)",
                hour,
                (hour + 1) % 24,
                count
            );
            for (h, &entries) in rep.histogram.iter().enumerate() {
                if entries > 0 {
                    println!("  {h:02}:00  {entries}");
                }
            }
        }
        None => println!("No data available yet."),
    }
}
