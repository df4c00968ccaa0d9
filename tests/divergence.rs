#[cfg(test)]
mod tests {
    use cable_neuron::{
        cell::{BallAndStick, StimulusParameters},
        engine::RunParameters,
        error::{CableNeuronError, SimulationError},
        solver::CableSolver,
    };


    #[test]
    pub fn test_diverging_voltage_aborts_run() -> Result<(), CableNeuronError> {
        let cell = BallAndStick::new(0)?;
        let stimulus = StimulusParameters { amp: -1e30, ..StimulusParameters::default() }.on_dendrite(&cell);
        let mut simulation = cell.into_simulation(CableSolver::default(), stimulus)?;

        match simulation.run(RunParameters::default()) {
            Err(CableNeuronError::SimulationRelatedError(SimulationError::NonFiniteVoltage { section, t })) => {
                assert!(section == "soma" || section == "dend", "unexpected section {}", section);
                assert!(t > 5. && t <= 25., "diverged at {} ms", t);
            },
            other => panic!("expected non-finite voltage, got {:?}", other.map(|i| i.time.len())),
        }

        // the diverged state cannot be continued
        assert!(matches!(
            simulation.integrate_to(25.),
            Err(CableNeuronError::SimulationRelatedError(SimulationError::NotInitialized))
        ));
        assert!(matches!(
            simulation.integrate_to(30.),
            Err(CableNeuronError::SimulationRelatedError(SimulationError::NotInitialized))
        ));

        // initializing again recovers
        simulation.set_amplitude(0.1)?;
        let recording = simulation.run(RunParameters::default())?;
        assert_eq!(recording.time.len(), 1001);
        assert!(recording.traces.iter().all(|i| i.trace.samples.iter().all(|v| v.is_finite())));

        Ok(())
    }
}
