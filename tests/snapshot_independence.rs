#[cfg(test)]
mod tests {
    use cable_neuron::{
        cell::{BallAndStick, StimulusParameters},
        engine::RunParameters,
        error::CableNeuronError,
        solver::CableSolver,
    };


    #[test]
    pub fn test_later_runs_do_not_overwrite_recordings() -> Result<(), CableNeuronError> {
        let cell = BallAndStick::new(0)?;
        let stimulus = StimulusParameters { amp: 0.075, ..StimulusParameters::default() }.on_dendrite(&cell);
        let mut simulation = cell.clone().into_simulation(CableSolver::default(), stimulus)?;

        let weak = simulation.run(RunParameters::default())?;
        let weak_copy = weak.clone();

        simulation.set_amplitude(0.3)?;
        let strong = simulation.run(RunParameters::default())?;

        assert_eq!(weak, weak_copy);
        assert_ne!(weak, strong);

        // a shorter run afterwards leaves the earlier time vectors alone
        let short = simulation.run(RunParameters { t_stop: 5., ..RunParameters::default() })?;
        assert_eq!(short.time.len(), 201);
        assert_eq!(weak.time.len(), 1001);
        assert_eq!(strong.time.len(), 1001);

        Ok(())
    }

    #[test]
    pub fn test_clones_are_independent() -> Result<(), CableNeuronError> {
        let cell = BallAndStick::new(0)?;
        let stimulus = StimulusParameters::default().on_dendrite(&cell);
        let mut simulation = cell.clone().into_simulation(CableSolver::default(), stimulus)?;
        let mut other = simulation.clone();

        other.set_amplitude(0.2)?;
        other.set_nseg(cell.dend, 21)?;

        assert_eq!(simulation.stimulus().map(|i| i.amp), Some(0.1));
        assert_eq!(simulation.morphology().section(cell.dend)?.nseg, 1);

        let original = simulation.run(RunParameters::default())?;
        let changed = other.run(RunParameters::default())?;
        assert_ne!(original, changed);

        Ok(())
    }
}
