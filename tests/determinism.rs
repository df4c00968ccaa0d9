#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use cable_neuron::{
        cell::{BallAndStick, StimulusParameters},
        engine::RunParameters,
        error::CableNeuronError,
        solver::CableSolver,
        sweep::{run_sweep, run_sweep_parallel, segment_counts, tutorial_amplitudes, SweepPlan},
    };


    #[test]
    pub fn test_repeated_runs_are_identical() -> Result<(), CableNeuronError> {
        let cell = BallAndStick::new(0)?;
        let stimulus = StimulusParameters::default().on_dendrite(&cell);
        let mut simulation = cell.into_simulation(CableSolver::default(), stimulus)?;

        let first = simulation.run(RunParameters::default())?;
        let second = simulation.run(RunParameters::default())?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    pub fn test_parallel_matches_sequential() -> Result<(), CableNeuronError> {
        let cell = BallAndStick::new(0)?;
        let stimulus = StimulusParameters::default().on_dendrite(&cell);
        let simulation = cell.clone().into_simulation(CableSolver::default(), stimulus)?;
        let params = RunParameters { t_stop: 10., ..RunParameters::default() };

        let plan = SweepPlan::amplitudes_and_segments(tutorial_amplitudes(), cell.dend, segment_counts());
        let sequential = run_sweep(&simulation, &plan, params)?;
        let parallel = run_sweep_parallel(&simulation, &plan, params)?;

        assert_eq!(sequential.len(), 8);
        assert_eq!(sequential, parallel);

        Ok(())
    }

    #[test]
    pub fn test_parallel_matches_sequential_random_amplitudes() -> Result<(), CableNeuronError> {
        let mut rng = StdRng::seed_from_u64(1);
        let amplitudes: Vec<f64> = (0..12).map(|_| rng.gen_range(0.0..0.4)).collect();

        let cell = BallAndStick::new(0)?;
        let stimulus = StimulusParameters::default().on_dendrite(&cell);
        let simulation = cell.into_simulation(CableSolver::default(), stimulus)?;
        let params = RunParameters { t_stop: 8., ..RunParameters::default() };

        let plan = SweepPlan::amplitudes(amplitudes.clone());
        let sequential = run_sweep(&simulation, &plan, params)?;
        let parallel = run_sweep_parallel(&simulation, &plan, params)?;

        assert_eq!(sequential, parallel);
        for (result, amplitude) in parallel.iter().zip(amplitudes.iter()) {
            assert_eq!(result.point.amplitude, *amplitude);
        }

        Ok(())
    }
}
