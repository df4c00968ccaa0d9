use std::{
    env,
    fs::{create_dir_all, File},
    io::BufWriter,
    path::Path,
};
use tracing_subscriber::EnvFilter;
use cable_neuron::{
    cell::BallAndStick,
    config::{RunConfig, SweepConfig},
    engine::Simulation,
    error::{CableNeuronError, ConfigError},
    recording::Recording,
    solver::CableSolver,
    sweep::{run_sweep, run_sweep_parallel, write_csv, SweepPlan, SweepResult},
};


fn summarize(label: &str, recording: &Recording) {
    for recorded in &recording.traces {
        if let Some((index, peak)) = recorded.trace.peak() {
            tracing::info!(
                run = label,
                probe = %recorded.label,
                peak,
                t = recording.time.get(index).copied().unwrap_or(f64::NAN),
                spikes = recorded.trace.count_spikes(0.),
                "peak voltage"
            );
        }
    }
}

fn run_configured_sweep(
    simulation: &Simulation<CableSolver>,
    cell: &BallAndStick,
    config: &RunConfig,
    sweep: &SweepConfig,
) -> Result<Vec<SweepResult>, CableNeuronError> {
    let plan = if sweep.nseg.is_empty() {
        SweepPlan::amplitudes(sweep.amplitudes.clone())
    } else {
        SweepPlan::amplitudes_and_segments(sweep.amplitudes.clone(), cell.dend, sweep.nseg.clone())
    };

    tracing::info!(sweep = %sweep.name, points = plan.points().len(), parallel = config.parallel, "starting sweep");

    if config.parallel {
        run_sweep_parallel(simulation, &plan, config.run)
    } else {
        run_sweep(simulation, &plan, config.run)
    }
}

fn main() -> Result<(), CableNeuronError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let config = match args.get(1) {
        Some(path) if path.ends_with(".toml") => RunConfig::from_file(Path::new(path))?,
        Some(path) => {
            return Err(ConfigError::InvalidField(format!("{} is not a .toml file", path)).into());
        },
        None => {
            tracing::info!("no config given, running the default ball and stick scenario");
            RunConfig::default()
        },
    };

    let cell = BallAndStick::from_parameters(0, &config.cell)?;
    let stimulus = config.stimulus.on_dendrite(&cell);
    let mut simulation = cell.clone().into_simulation(CableSolver::new(config.dt)?, stimulus)?;

    tracing::info!(cell = %cell, dt = config.dt, t_stop = config.run.t_stop, "running scenario");

    let recording = simulation.run(config.run)?;
    summarize(&config.tag, &recording);

    create_dir_all(&config.output_directory)?;
    let path = config.output_directory.join(format!("{}.csv", config.tag));
    let mut file = BufWriter::new(File::create(&path)?);
    recording.write_csv(&mut file)?;
    tracing::info!(path = %path.display(), "wrote scenario output");

    for sweep in &config.sweeps {
        let results = run_configured_sweep(&simulation, &cell, &config, sweep)?;
        for result in &results {
            summarize(&result.file_stem(&sweep.name), &result.recording);
        }

        write_csv(&results, &config.output_directory, &format!("{}_{}", config.tag, sweep.name))?;
    }

    Ok(())
}
