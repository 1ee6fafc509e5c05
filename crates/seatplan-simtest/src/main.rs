//! Seating Engine Headless Harness
//!
//! Validates the allocation engine end to end without a console front end.
//! Runs entirely in-process; files are only touched when asked to.
//!
//! Usage:
//!   cargo run -p seatplan-simtest
//!   cargo run -p seatplan-simtest -- --verbose --seed 7
//!   cargo run -p seatplan-simtest -- --records roster.txt --export plan.txt --save saved.txt
//!   cargo run -p seatplan-simtest -- --json
//!   cargo run -p seatplan-simtest -- --navigate
//!
//! Engine logging goes through `RUST_LOG` (e.g. `RUST_LOG=info`).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use seatplan_logic::allocator::SeatingAllocator;
use seatplan_logic::config::{validate_topology, CollapsePolicy, TopologyConfig};
use seatplan_logic::error::SeatingError;
use seatplan_logic::integrity::Severity;
use seatplan_logic::navigation::{Cursor, NavCommand};
use seatplan_logic::records::RecordLayout;
use seatplan_logic::topology::RoomAddress;

// ── Default topology and roster ─────────────────────────────────────────
const TOPOLOGY_JSON: &str = include_str!("../../../data/topology.json");
const SAMPLE_ROSTER: &str = include_str!("../../../data/sample_roster.txt");

const SUBJECTS: [&str; 4] = ["Math", "Physics", "Chemistry", "Biology"];

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Options {
    verbose: bool,
    json: bool,
    navigate: bool,
    seed: u64,
    records: Option<String>,
    export: Option<String>,
    save: Option<String>,
}

impl Options {
    fn parse() -> Self {
        let mut opts = Options {
            verbose: false,
            json: false,
            navigate: false,
            seed: 42,
            records: None,
            export: None,
            save: None,
        };
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--verbose" => opts.verbose = true,
                "--json" => opts.json = true,
                "--navigate" => opts.navigate = true,
                "--seed" => match args.next().and_then(|s| s.parse().ok()) {
                    Some(seed) => opts.seed = seed,
                    None => log::warn!("--seed needs a number, keeping {}", opts.seed),
                },
                "--records" => opts.records = args.next(),
                "--export" => opts.export = args.next(),
                "--save" => opts.save = args.next(),
                other => log::warn!("Ignoring unknown argument {}", other),
            }
        }
        opts
    }
}

fn main() {
    env_logger::init();
    let opts = Options::parse();
    println!("=== Seating Engine Harness ===\n");

    let config: TopologyConfig = match serde_json::from_str(TOPOLOGY_JSON) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("topology.json parse error: {}", e);
            std::process::exit(1);
        }
    };
    let roster = match &opts.records {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Cannot open {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SAMPLE_ROSTER.to_string(),
    };

    let mut results = Vec::new();

    // 1. Topology configuration
    results.extend(validate_topology_config(&config, opts.verbose));

    // 2. Placement scenarios
    results.extend(validate_placement_scenarios(opts.verbose));

    // 3. Capacity limits
    results.extend(validate_capacity(opts.verbose));

    // 4. Randomized roster sweep
    results.extend(validate_random_roster(opts.seed, opts.verbose));

    // 5. Record files
    let (record_results, seats) = validate_records(&config, &roster, opts.records.is_none(), opts.verbose);
    results.extend(record_results);

    // 6. Snapshots
    if let Some(seats) = &seats {
        results.extend(validate_snapshot(seats, opts.verbose));
    }

    // ── Outputs ──
    if let Some(seats) = &seats {
        if let Some(path) = &opts.export {
            report_io("export", path, write_to(path, |w| seats.export_seating_plan(w)));
        }
        if let Some(path) = &opts.save {
            report_io("save", path, write_to(path, |w| seats.save_records(w).map(|_| ())));
        }
        if opts.json {
            match serde_json::to_string_pretty(&seats.summary()) {
                Ok(json) => println!("\n{}", json),
                Err(e) => eprintln!("summary serialization failed: {}", e),
            }
        }
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || opts.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if opts.navigate {
        if let Some(seats) = &seats {
            if let Err(e) = navigate(seats) {
                eprintln!("navigation stopped: {}", e);
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn write_to<F>(path: &str, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)
}

fn report_io(what: &str, path: &str, outcome: io::Result<()>) {
    match outcome {
        Ok(()) => println!("Seating plan {} written to {}", what, path),
        Err(e) => eprintln!("Cannot {} to {}: {}", what, path, e),
    }
}

fn allocator(blocks: usize, floors: usize, rooms: usize, grid: usize) -> Option<SeatingAllocator> {
    SeatingAllocator::new(TopologyConfig::new(blocks, floors, rooms, grid)).ok()
}

fn integrity_errors(seats: &SeatingAllocator) -> Vec<String> {
    seats
        .validate_integrity()
        .into_iter()
        .filter(|issue| issue.severity == Severity::Error)
        .map(|issue| format!("[{}] {}", issue.category, issue.message))
        .collect()
}

fn integrity_result(name: &str, seats: &SeatingAllocator) -> TestResult {
    let errors = integrity_errors(seats);
    TestResult {
        name: name.into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!("{} students, no integrity errors", seats.occupied())
        } else {
            format!("{} errors, first: {}", errors.len(), errors[0])
        },
    }
}

/// Sorted (roll, batch, subject) multiset of everyone seated.
fn triples(seats: &SeatingAllocator) -> Vec<(u32, u32, String)> {
    let mut all: Vec<_> = seats
        .students()
        .map(|l| {
            (
                l.student.roll_number(),
                l.student.batch_id(),
                l.student.subject().to_string(),
            )
        })
        .collect();
    all.sort();
    all
}

// ── 1. Topology ─────────────────────────────────────────────────────────

fn validate_topology_config(config: &TopologyConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Topology ---");
    let mut results = Vec::new();

    let errors = validate_topology(config);
    results.push(TestResult {
        name: "topology_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!(
                "{} blocks x {} floors x {} rooms, grid {}",
                config.blocks, config.floors_per_block, config.rooms_per_floor, config.grid_size
            )
        } else {
            format!("{:?}", errors)
        },
    });

    let seats = match SeatingAllocator::new(config.clone()) {
        Ok(seats) => seats,
        Err(e) => {
            results.push(TestResult {
                name: "topology_build".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let summary = seats.summary();
    results.push(TestResult {
        name: "topology_seat_count".into(),
        passed: summary.seats == config.total_seats() && summary.rooms == config.total_rooms(),
        detail: format!("{} rooms, {} seats", summary.rooms, summary.seats),
    });

    let block_ids: String = seats.blocks().iter().map(|b| b.id()).collect();
    results.push(TestResult {
        name: "topology_block_ids".into(),
        passed: block_ids.len() == config.blocks && block_ids.starts_with('A'),
        detail: format!("blocks {}", block_ids),
    });

    results.push(integrity_result("topology_wiring", &seats));

    if verbose {
        println!("  built {} seats", summary.seats);
    }
    results
}

// ── 2. Placement Scenarios ──────────────────────────────────────────────

fn validate_placement_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Placement Scenarios ---");
    let mut results = Vec::new();
    let Some(mut seats) = allocator(1, 1, 2, 2) else {
        results.push(TestResult {
            name: "scenario_build".into(),
            passed: false,
            detail: "1x1x2 grid 2 rejected".into(),
        });
        return results;
    };
    let first = RoomAddress::new(0, 0, 0);
    let second = RoomAddress::new(0, 0, 1);
    let roll_at = |seats: &SeatingAllocator, room: RoomAddress, row, col| {
        seats.student_at(room.seat(row, col)).map(|s| s.roll_number())
    };

    let placed = seats.insert_student(10, 22, "Math");
    results.push(TestResult {
        name: "scenario_first_seat".into(),
        passed: matches!(placed, Ok(p) if p.seat == first.seat(0, 0)),
        detail: format!("{:?}", placed.map(|p| p.seat.to_string())),
    });

    let placed = seats.insert_student(5, 22, "Math");
    results.push(TestResult {
        name: "scenario_displacement".into(),
        passed: placed.is_ok()
            && roll_at(&seats, first, 0, 0) == Some(5)
            && roll_at(&seats, first, 1, 0) == Some(10),
        detail: format!(
            "front {:?}, next {:?}",
            roll_at(&seats, first, 0, 0),
            roll_at(&seats, first, 1, 0)
        ),
    });

    let before = seats.snapshot();
    let rejected = seats.insert_student(7, 21, "Math");
    results.push(TestResult {
        name: "scenario_invalid_batch".into(),
        passed: rejected == Err(SeatingError::InvalidBatch(21)) && seats.snapshot() == before,
        detail: format!("{:?}", rejected.map(|p| p.seat.to_string())),
    });

    for roll in [20, 30] {
        let _ = seats.insert_student(roll, 22, "Math");
    }
    let removal = seats.delete_student(10);
    let shift = removal.as_ref().ok().and_then(|r| r.shift);
    results.push(TestResult {
        name: "scenario_backward_shift".into(),
        passed: shift.is_some_and(|s| s.roll_number == 20 && s.to == first.seat(1, 0))
            && seats.room(first).map(|r| r.occupied()) == Some(2)
            && seats.room(second).map(|r| r.occupied()) == Some(1),
        detail: match shift {
            Some(s) => format!("{} moved {} -> {}", s.roll_number, s.from, s.to),
            None => "no shift".into(),
        },
    });

    results.push(integrity_result("scenario_integrity", &seats));
    if verbose {
        if let Some(text) = seats.render_room(first) {
            print!("{}", text);
        }
    }
    results
}

// ── 3. Capacity ─────────────────────────────────────────────────────────

fn validate_capacity(verbose: bool) -> Vec<TestResult> {
    println!("--- Capacity ---");
    let mut results = Vec::new();

    for grid in 2..=4 {
        let Some(mut seats) = allocator(1, 1, 2, grid) else {
            continue;
        };
        // Odd grids have one more even column than odd ones.
        let even_seats = seats.layout().traversal().filter(|s| s.col % 2 == 0).count();
        let odd_seats = seats.layout().total_seats() - even_seats;
        let mut inserted = 0;
        for i in 0..even_seats as u32 {
            inserted += usize::from(seats.insert_student(100 + i, 22, "Math").is_ok());
        }
        for i in 0..odd_seats as u32 {
            inserted += usize::from(seats.insert_student(100 + i, 23, "Math").is_ok());
        }

        let before = seats.snapshot();
        let refused = [(1, 22), (1, 23), (9999, 24), (9999, 25)]
            .into_iter()
            .filter(|&(roll, batch)| {
                seats.insert_student(roll, batch, "Math")
                    == Err(SeatingError::PlacementFailed { roll_number: roll })
            })
            .count();

        results.push(TestResult {
            name: format!("capacity_grid_{}", grid),
            passed: inserted == seats.layout().total_seats() && refused == 4 && seats.snapshot() == before,
            detail: format!(
                "{} of {} seated, {} of 4 extra students refused",
                inserted,
                seats.layout().total_seats(),
                refused
            ),
        });
        if verbose {
            println!("  grid {}: {} students", grid, seats.occupied());
        }
    }
    results
}

// ── 4. Randomized Roster ────────────────────────────────────────────────

fn validate_random_roster(seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Random Roster (seed {}) ---", seed);
    let mut results = Vec::new();

    for policy in [CollapsePolicy::Deferred, CollapsePolicy::BorrowForward] {
        let mut rng = StdRng::seed_from_u64(seed);
        let config = TopologyConfig::new(2, 2, 3, 4).with_collapse_policy(policy);
        let Ok(mut seats) = SeatingAllocator::new(config) else {
            continue;
        };

        let mut rolls: Vec<u32> = (1..=150).collect();
        rolls.shuffle(&mut rng);
        let mut seated = Vec::new();
        let mut failures: BTreeMap<String, usize> = BTreeMap::new();
        for &roll in &rolls {
            let batch = rng.gen_range(22..=25);
            let subject = SUBJECTS[rng.gen_range(0..SUBJECTS.len())];
            match seats.insert_student(roll, batch, subject) {
                Ok(_) => seated.push(roll),
                Err(e) => {
                    let kind = match e {
                        SeatingError::PlacementFailed { .. } => "placement_failed",
                        _ => "other",
                    };
                    *failures.entry(kind.to_string()).or_insert(0) += 1;
                }
            }
        }

        seated.shuffle(&mut rng);
        let to_delete = seated.len() / 3;
        let mut deleted = 0;
        let mut shifts = 0;
        let mut borrowed = 0;
        for &roll in seated.iter().take(to_delete) {
            if let Ok(removal) = seats.delete_student(roll) {
                deleted += 1;
                shifts += usize::from(removal.shift.is_some());
                borrowed += removal.collapses.iter().map(|e| e.borrowed.len()).sum::<usize>();
            }
        }

        let label = format!("{:?}", policy).to_lowercase();
        results.push(TestResult {
            name: format!("random_{}_accounting", label),
            passed: deleted == to_delete && seats.occupied() == seated.len() - deleted,
            detail: format!(
                "{} seated, {} refused {:?}, {} deleted, {} shifts, {} borrowed",
                seated.len(),
                rolls.len() - seated.len(),
                failures,
                deleted,
                shifts,
                borrowed
            ),
        });
        results.push(integrity_result(&format!("random_{}_integrity", label), &seats));

        if policy == CollapsePolicy::Deferred {
            results.push(TestResult {
                name: "random_deferred_moves_nobody".into(),
                passed: borrowed == 0,
                detail: format!("{} borrowed", borrowed),
            });
        }
        if verbose {
            let summary = seats.summary();
            println!("  {}: {:.1}% occupied", label, summary.occupancy_rate);
        }
    }
    results
}

// ── 5. Record Files ─────────────────────────────────────────────────────

fn validate_records(
    config: &TopologyConfig,
    roster: &str,
    bundled: bool,
    verbose: bool,
) -> (Vec<TestResult>, Option<SeatingAllocator>) {
    println!("--- Record Files ---");
    let mut results = Vec::new();
    let Ok(mut seats) = SeatingAllocator::new(config.clone()) else {
        results.push(TestResult {
            name: "records_build".into(),
            passed: false,
            detail: "topology rejected".into(),
        });
        return (results, None);
    };

    match seats.load_records(roster.as_bytes(), RecordLayout::BatchFirst) {
        Ok(report) => {
            results.push(TestResult {
                name: "records_load".into(),
                passed: report.malformed.is_none() && (!bundled || report.rejected.is_empty()),
                detail: format!(
                    "{} inserted, {} rejected{}",
                    report.inserted,
                    report.rejected.len(),
                    report
                        .malformed
                        .as_ref()
                        .map(|e| format!(", stopped at {}", e))
                        .unwrap_or_default()
                ),
            });
            if verbose {
                for (record, err) in &report.rejected {
                    println!("  rejected {}: {}", record.roll_number, err);
                }
            }
        }
        Err(e) => {
            results.push(TestResult {
                name: "records_load".into(),
                passed: false,
                detail: e.to_string(),
            });
            return (results, Some(seats));
        }
    }
    results.push(integrity_result("records_integrity", &seats));

    // Save → clear → reload
    let expected = triples(&seats);
    let mut saved = Vec::new();
    let roundtrip = seats
        .save_records(&mut saved)
        .and_then(|_| {
            let mut reloaded = seats.clone();
            reloaded.clear();
            reloaded.load_records(&saved[..], RecordLayout::RollFirst).map(|report| (reloaded, report))
        });
    match roundtrip {
        Ok((reloaded, report)) => results.push(TestResult {
            name: "records_roundtrip".into(),
            passed: triples(&reloaded) == expected && report.malformed.is_none(),
            detail: format!("{} students saved and reloaded", report.inserted),
        }),
        Err(e) => results.push(TestResult {
            name: "records_roundtrip".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    let mut plan = Vec::new();
    let exported = seats.export_seating_plan(&mut plan);
    let text = String::from_utf8_lossy(&plan);
    let headers = text.lines().filter(|l| l.starts_with("Block ")).count();
    results.push(TestResult {
        name: "records_export".into(),
        passed: exported.is_ok() && headers == seats.layout().total_rooms(),
        detail: format!("{} room grids, {} bytes", headers, plan.len()),
    });

    (results, Some(seats))
}

// ── 6. Snapshots ────────────────────────────────────────────────────────

fn validate_snapshot(seats: &SeatingAllocator, verbose: bool) -> Vec<TestResult> {
    println!("--- Snapshots ---");
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    let outcome = seats
        .save_snapshot(&mut buffer)
        .and_then(|_| SeatingAllocator::load_snapshot(&buffer[..]));
    match outcome {
        Ok(restored) => results.push(TestResult {
            name: "snapshot_roundtrip".into(),
            passed: restored.snapshot() == seats.snapshot(),
            detail: format!("{} students, {} bytes", restored.occupied(), buffer.len()),
        }),
        Err(e) => results.push(TestResult {
            name: "snapshot_roundtrip".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    if let Some(byte) = buffer.first_mut() {
        *byte ^= 0xFF;
    }
    results.push(TestResult {
        name: "snapshot_rejects_corruption".into(),
        passed: SeatingAllocator::load_snapshot(&buffer[..]).is_err(),
        detail: "version byte flipped".into(),
    });

    if verbose {
        println!("  snapshot size {} bytes", buffer.len());
    }
    results
}

// ── Interactive navigation ──────────────────────────────────────────────

fn navigate(seats: &SeatingAllocator) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut cursor = Cursor::default();

    println!("\n=== Interactive Navigation ===");
    println!("Use: w(up floor) s(down floor) a(prev room) d(next room) q(quit)\n");

    let mut lines = stdin.lock().lines();
    loop {
        if let Some(text) = seats.render_room(cursor.room) {
            print!("{}", text);
        }
        println!("Current: {}", cursor.room);
        print!("Command: ");
        stdout.flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;
        let Some(key) = line.trim().chars().next() else {
            continue;
        };
        match NavCommand::parse(key) {
            Some(NavCommand::Quit) => return Ok(()),
            Some(cmd) => {
                if !cursor.apply(cmd, seats.layout()) {
                    println!("Already at the edge.");
                }
            }
            None => println!("Unknown command {:?}", key),
        }
    }
}
