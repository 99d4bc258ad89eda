//! grid — packet delivery over a synthetic street grid.
//!
//! Generates (or loads from CSV) a fleet of vehicles with predicted
//! trajectories, then carries two packets from the same source to the same
//! destination: one greedy, re-estimating EDR/EDD at every contact, and one
//! source-routed along the encounter graph computed at creation.
//!
//! ```text
//! cargo run -p grid                    # synthetic fleet
//! cargo run -p grid -- fleet.csv       # trajectories from CSV
//! RUST_LOG=tpd_forward=debug cargo run -p grid
//! ```

mod network;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tpd_core::{PacketId, SimTime, TpdConfig};
use tpd_encounter::TrajectoryOracle;
use tpd_forward::{ContactIndex, EngineEstimator, MetricsBoard, NextCarrierSelector, Packet};
use tpd_graph::{GraphWorkspace, TpdEngine};
use tpd_trajectory::{load_fleet_csv, GeneratorParams, TrajectoryGenerator, VehicleFleet};

use network::build_grid;

// ── Constants ─────────────────────────────────────────────────────────────────

const GRID_SIDE:     u32 = 6;
const SPACING_M:     f64 = 200.0;
const VEHICLE_COUNT: usize = 60;
const SEED:          u64 = 42;
const TICK_SECS:     f64 = 5.0;
const HORIZON_SECS:  f64 = 900.0;

fn load_or_generate(network: &tpd_spatial::RoadNetwork) -> Result<VehicleFleet> {
    if let Some(path) = std::env::args().nth(1) {
        return load_fleet_csv(Path::new(&path)).with_context(|| format!("loading fleet from {path}"));
    }
    let params = GeneratorParams { hops: 40, ..GeneratorParams::default() };
    Ok(TrajectoryGenerator::new(network, SEED, params).fleet(VEHICLE_COUNT)?)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Road network and fleet.
    let network = build_grid(GRID_SIDE, SPACING_M);
    info!(nodes = network.node_count(), edges = network.edge_count(), "street grid built");

    let fleet = load_or_generate(&network)?;
    if fleet.len() < 2 {
        anyhow::bail!("need at least two vehicles, fleet has {}", fleet.len());
    }
    info!(vehicles = fleet.len(), "fleet ready");

    // 2. Configurations for the two routing policies.
    let greedy_config = TpdConfig { packet_time_to_live: HORIZON_SECS, ..TpdConfig::default() };
    let source_config = TpdConfig {
        encounter_graph_source_routing: true,
        encounter_graph_optimization:   true,
        ..greedy_config.clone()
    };
    greedy_config.validate()?;
    source_config.validate()?;

    let source = fleet.ids().next().context("empty fleet")?;
    let destination = fleet.ids().last().context("empty fleet")?;
    let start = SimTime::ZERO;

    // 3. Source-side metrics and the frozen plan.
    let oracle = TrajectoryOracle::new(&fleet, &greedy_config);
    let t0 = Instant::now();
    let greedy_engine = TpdEngine::new(&oracle, &fleet, &greedy_config);
    let initial = greedy_engine.compute_edr_and_edd(&mut GraphWorkspace::new(), start, source, destination)?;
    info!(%source, %destination, edr = initial.edr, edd = initial.edd, "full fan-out metrics");

    let source_engine = TpdEngine::new(&oracle, &fleet, &source_config);
    let plan = source_engine.plan(&mut GraphWorkspace::new(), start, source, destination)?;
    info!(
        edr = plan.metrics.edr,
        edd = plan.metrics.edd,
        nodes = plan.graph.len(),
        admitted = plan.report.admitted,
        oracle_calls = plan.report.oracle_calls,
        elapsed_ms = t0.elapsed().as_secs_f64() * 1e3,
        "optimal-subsequence plan"
    );

    let mut greedy = Packet::new(PacketId(0), source, destination, start, HORIZON_SECS);
    let mut routed = Packet::source_routed(PacketId(1), plan, HORIZON_SECS);

    // 4. Tick through time, offering each packet to its carrier's neighbours.
    let board = MetricsBoard::new();
    let mut estimator = EngineEstimator::new(greedy_engine);
    let mut lanes = [
        ("greedy", &mut greedy, &greedy_config, true),
        ("source-routed", &mut routed, &source_config, true),
    ];
    let mut now = start;
    while now.secs() <= HORIZON_SECS && lanes.iter().any(|l| l.3) {
        let contacts = ContactIndex::build(&network, &fleet, now);
        for (name, packet, config, active) in lanes.iter_mut() {
            if !*active {
                continue;
            }
            let selector = NextCarrierSelector::new(&network, &contacts, config).with_board(&board);
            match selector.select(&mut estimator, packet, now) {
                Ok(Some(h)) => {
                    info!(policy = *name, packet = %packet.id, %now, from = %h.from, to = %h.to, edd = h.metrics.edd, "hand-off");
                    *active = !packet.is_delivered();
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(policy = *name, packet = %packet.id, %now, error = %e, "forwarding stopped");
                    *active = false;
                }
            }
        }
        now = now.offset(TICK_SECS);
    }

    // 5. Summary.
    println!();
    println!("{:<14} {:<10} {:<6} {:<10}", "Packet", "Delivered", "Hops", "Carrier");
    println!("{}", "-".repeat(42));
    for (name, p) in [("greedy", &greedy), ("source-routed", &routed)] {
        println!("{:<14} {:<10} {:<6} {:<10}", name, p.is_delivered(), p.hops(), p.carrier());
    }
    println!("metrics board entries: {}", board.len());

    Ok(())
}
