#[cfg(test)]
mod tests {
    use cable_neuron::{
        cell::{BallAndStick, StimulusParameters},
        engine::{RunParameters, Simulation},
        error::{CableNeuronError, SimulationError},
        recording::Recording,
        solver::CableSolver,
        sweep::{fine_amplitudes, run_sweep, tutorial_amplitudes, SweepPlan},
    };


    fn get_simulation() -> Result<(BallAndStick, Simulation<CableSolver>), CableNeuronError> {
        let cell = BallAndStick::new(0)?;
        let stimulus = StimulusParameters::default().on_dendrite(&cell);
        let simulation = cell.clone().into_simulation(CableSolver::default(), stimulus)?;

        Ok((cell, simulation))
    }

    fn soma_peak(cell: &BallAndStick, recording: &Recording) -> f64 {
        recording.trace(&cell.soma_probe())
            .and_then(|trace| trace.peak_between(&recording.time, 5., 25.))
            .map_or(f64::NEG_INFINITY, |(_, v)| v)
    }

    #[test]
    pub fn test_stimulus_depolarizes_soma() -> Result<(), CableNeuronError> {
        let (cell, simulation) = get_simulation()?;

        let mut control = simulation.clone();
        control.set_amplitude(0.)?;
        let control_peak = soma_peak(&cell, &control.run(RunParameters::default())?);

        let results = run_sweep(&simulation, &SweepPlan::amplitudes(tutorial_amplitudes()), RunParameters::default())?;
        assert_eq!(results.len(), 4);

        for result in &results {
            let peak = soma_peak(&cell, &result.recording);

            assert!(peak > -65., "amp {} peaked at {}", result.label, peak);
            assert!(peak > control_peak, "amp {} peaked at {} below control {}", result.label, peak, control_peak);
            assert_eq!(result.recording.time.len(), 1001);
        }

        Ok(())
    }

    #[test]
    pub fn test_labels_and_stems() -> Result<(), CableNeuronError> {
        let (_, simulation) = get_simulation()?;
        let params = RunParameters { t_stop: 1., ..RunParameters::default() };

        let results = run_sweep(&simulation, &SweepPlan::amplitudes(fine_amplitudes()), params)?;
        let labels: Vec<&str> = results.iter().map(|i| i.label.as_str()).collect();

        assert_eq!(labels, vec!["0.02", "0.05", "0.075", "0.1", "0.15"]);
        assert_eq!(results[3].file_stem("fine"), "fine_amp_0.1");

        Ok(())
    }

    #[test]
    pub fn test_sweep_leaves_simulation_untouched() -> Result<(), CableNeuronError> {
        let (_, simulation) = get_simulation()?;
        let before = simulation.stimulus().copied();

        run_sweep(&simulation, &SweepPlan::amplitudes(vec![0.3]), RunParameters { t_stop: 2., ..RunParameters::default() })?;

        assert_eq!(simulation.stimulus().copied(), before);
        assert_eq!(simulation.backend().step_count(), 0);

        Ok(())
    }

    #[test]
    pub fn test_sweep_requires_stimulus() -> Result<(), CableNeuronError> {
        let cell = BallAndStick::new(0)?;
        let simulation = Simulation::with_cable_solver(cell.morphology, cell.biophysics)?;

        assert!(matches!(
            run_sweep(&simulation, &SweepPlan::amplitudes(vec![0.1]), RunParameters::default()),
            Err(CableNeuronError::SimulationRelatedError(SimulationError::StimulusNotConfigured))
        ));

        Ok(())
    }
}
