//! pointmass2d headless runner
//!
//! Usage: `pointmass2d [scenario.json] [frames]`
//!
//! Loads a scenario (or the built-in demo), runs it for a number of frames and
//! logs contacts and final particle states. Set `RUST_LOG=debug` for entity
//! setup, `RUST_LOG=trace` for every contact.

#[cfg(not(target_arch = "wasm32"))]
use pointmass2d::{Result, ScenarioConfig, Simulation, StepEvent};

/// Box with a bowl floor, a pendulum pair and a scattered handful of balls
#[cfg(not(target_arch = "wasm32"))]
const DEMO_SCENARIO: &str = r#"{
    "sim": { "restitution": 0.9 },
    "particles": [
        { "pos": [3.0, 8.0], "radius": 0.2, "mass": 1.0 },
        { "pos": [4.0, 8.0], "vel": [0.0, 2.0], "radius": 0.2, "mass": 1.0 }
    ],
    "barriers": [
        { "kind": "polyline", "points": [[0, 10], [0, 0], [10, 0], [10, 10]] },
        { "kind": "arc", "centre": [5.0, 5.0], "radius": 4.5,
          "start_angle": 3.14159265, "end_angle": 6.28318531, "arc": "concave" },
        { "kind": "point", "pos": [5.0, 5.0] }
    ],
    "connectors": [
        { "first": 0, "second": 1, "natural_length": 1.0,
          "stiffness": 200.0, "damping": 2.0 }
    ],
    "scatter": { "seed": 2024, "count": 8, "min": [1.0, 6.0], "max": [9.0, 9.0],
                 "radius": 0.15, "mass": 0.5, "max_speed": 1.5 }
}"#;

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let scenario = match args.next() {
        Some(path) => ScenarioConfig::from_json_file(&path)?,
        None => {
            log::info!("No scenario given, running built-in demo");
            ScenarioConfig::from_json_str(DEMO_SCENARIO)?
        }
    };
    let frames: u64 = match args.next() {
        Some(raw) => raw
            .parse()
            .map_err(|_| pointmass2d::SimError::Config(format!("invalid frame count: {}", raw)))?,
        None => 100,
    };

    let mut sim = scenario.build()?;
    let initial_energy = sim.kinetic_energy();

    let mut contacts = 0usize;
    let mut collisions = 0usize;
    for frame in 0..frames {
        for event in sim.run_frame() {
            match event {
                StepEvent::BarrierContact { .. } => contacts += 1,
                StepEvent::ParticleCollision { first, second } => {
                    collisions += 1;
                    log::debug!(
                        "frame {}: particles {} and {} collided",
                        frame,
                        first.0,
                        second.0
                    );
                }
            }
        }
    }

    report(&sim, initial_energy, contacts, collisions);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn report(sim: &Simulation, initial_energy: f64, contacts: usize, collisions: usize) {
    log::info!(
        "Ran {} sub-steps ({:.3}s simulated): {} barrier contacts, {} particle collisions",
        sim.time_ticks(),
        sim.elapsed(),
        contacts,
        collisions
    );
    log::info!(
        "Kinetic energy {:.4} -> {:.4}",
        initial_energy,
        sim.kinetic_energy()
    );
    for (i, p) in sim.particles().iter().enumerate() {
        println!(
            "{:>3}  pos=({:>8.4}, {:>8.4})  vel=({:>8.4}, {:>8.4})",
            i,
            p.pos().x,
            p.pos().y,
            p.vel().x,
            p.vel().y
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("pointmass2d (headless) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; drivers embed `Simulation` directly
}
