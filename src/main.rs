use engine_cycle_simulator as ecs;
use ecs::{Engine, EngineConfig, EngineError, History};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DT: f64 = 1e-4; // [s]
const DURATION: f64 = 5.0; // [s]
const THROTTLE: f64 = 0.6;
const LOAD: f64 = 0.3;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,engine_cycle_simulator=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

fn run() -> Result<(), EngineError> {
    // optional engine file as first argument
    let mut engine = match std::env::args().nth(1) {
        Some(path) => Engine::from_json_file(path)?,
        None => Engine::new(EngineConfig::default())?,
    };
    println!("{}", engine);

    let steps = (DURATION / DT).round() as usize;
    let mut history = History::new();
    for step in 0..steps {
        engine.advance(DT, THROTTLE, LOAD)?;
        if step % 100 == 0 {
            history.record(&engine.snapshot());
        }
    }

    let rpm = history.column("rpm").unwrap_or_default();
    info!(
        samples = history.len(),
        rpm_min = rpm.fold(f64::INFINITY, |a, &b| a.min(b)),
        rpm_max = rpm.fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
        "run finished"
    );
    println!("{}", engine.snapshot());
    Ok(())
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        error!("{}", err);
        std::process::exit(1);
    }
}
