//! The capability interface a numerical backend provides, and the
//! simulation context that owns a model, its stimulus, its probes and a backend
//!
//! Model construction code only produces a [`Morphology`] and [`Biophysics`],
//! any type implementing [`SimulationBackend`] can then run it. Each call to
//! [`Simulation::run`] returns a freshly allocated [`Recording`] so results from
//! separate runs never alias one another.

use crate::biophysics::Biophysics;
use crate::error::{CableNeuronError, SimulationError};
use crate::morphology::{Morphology, SectionId};
use crate::recording::{Probe, RecordedTrace, Recording, Trace};
use crate::solver::CableSolver;
use crate::stimulus::CurrentClamp;


/// Operations a numerical backend must support to run a compartmental model
pub trait SimulationBackend: Clone + Send {
    /// Discretizes the morphology, invalidating any assigned biophysics
    fn build_morphology(&mut self, morphology: &Morphology) -> Result<(), CableNeuronError>;
    /// Installs electrical parameters and mechanisms on every section
    fn assign_biophysics(&mut self, biophysics: &Biophysics) -> Result<(), CableNeuronError>;
    /// Places (or with `None` removes) the current clamp
    fn configure_stimulus(&mut self, stimulus: Option<&CurrentClamp>) -> Result<(), CableNeuronError>;
    /// Registers a probe whose voltage is sampled every timestep
    fn record(&mut self, probe: Probe) -> Result<(), CableNeuronError>;
    /// Sets every voltage to `v_init` (mV) and states to steady state, resets time to zero
    fn initialize(&mut self, v_init: f64) -> Result<(), CableNeuronError>;
    /// Integrates from the current time until `t_stop` (ms)
    fn integrate_to(&mut self, t_stop: f64) -> Result<(), CableNeuronError>;
    /// Copy of the samples recorded at a probe since the last initialization
    fn read_trace(&self, probe: &Probe) -> Result<Trace, CableNeuronError>;
    /// Copy of the sample times since the last initialization
    fn read_time(&self) -> Vec<f64>;
    /// Current simulation time (ms)
    fn time(&self) -> f64;
}

/// Initial condition and duration of one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParameters {
    /// Initial membrane potential (mV)
    pub v_init: f64,
    /// Stop time (ms)
    pub t_stop: f64,
}

impl Default for RunParameters {
    fn default() -> Self {
        RunParameters {
            v_init: -65.,
            t_stop: 25.,
        }
    }
}

/// A model together with its stimulus, probes and backend,
/// cloning the context gives a fully independent simulation
#[derive(Debug, Clone)]
pub struct Simulation<B: SimulationBackend = CableSolver> {
    morphology: Morphology,
    biophysics: Biophysics,
    stimulus: Option<CurrentClamp>,
    probes: Vec<Probe>,
    backend: B,
}

impl Simulation<CableSolver> {
    /// Creates a simulation using the [`CableSolver`] backend with the default timestep
    pub fn with_cable_solver(morphology: Morphology, biophysics: Biophysics) -> Result<Self, CableNeuronError> {
        Simulation::new(morphology, biophysics, CableSolver::default())
    }
}

impl<B: SimulationBackend> Simulation<B> {
    /// Builds the model into the backend
    pub fn new(morphology: Morphology, biophysics: Biophysics, mut backend: B) -> Result<Self, CableNeuronError> {
        backend.build_morphology(&morphology)?;
        backend.assign_biophysics(&biophysics)?;

        Ok(Simulation {
            morphology,
            biophysics,
            stimulus: None,
            probes: vec![],
            backend,
        })
    }

    pub fn morphology(&self) -> &Morphology {
        &self.morphology
    }

    pub fn biophysics(&self) -> &Biophysics {
        &self.biophysics
    }

    pub fn stimulus(&self) -> Option<&CurrentClamp> {
        self.stimulus.as_ref()
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Places the current clamp, replacing any existing one
    pub fn set_stimulus(&mut self, stimulus: CurrentClamp) -> Result<(), CableNeuronError> {
        self.morphology.section(stimulus.section)?;
        self.backend.configure_stimulus(Some(&stimulus))?;
        self.stimulus = Some(stimulus);

        Ok(())
    }

    /// Removes the current clamp
    pub fn clear_stimulus(&mut self) -> Result<(), CableNeuronError> {
        self.backend.configure_stimulus(None)?;
        self.stimulus = None;

        Ok(())
    }

    /// Changes the amplitude (nA) of the existing current clamp
    pub fn set_amplitude(&mut self, amp: f64) -> Result<(), CableNeuronError> {
        let stimulus = self.stimulus.ok_or(SimulationError::StimulusNotConfigured)?;

        self.set_stimulus(CurrentClamp { amp, ..stimulus })
    }

    /// Records voltage at a probe in every subsequent run
    pub fn add_probe(&mut self, probe: Probe) -> Result<(), CableNeuronError> {
        self.morphology.section(probe.section)?;
        self.backend.record(probe)?;
        if !self.probes.contains(&probe) {
            self.probes.push(probe);
        }

        Ok(())
    }

    /// Changes the number of segments of a section and rebuilds the model,
    /// stimulus and probes keep their normalized locations
    pub fn set_nseg(&mut self, section: SectionId, nseg: usize) -> Result<(), CableNeuronError> {
        self.morphology.set_nseg(section, nseg)?;
        self.backend.build_morphology(&self.morphology)?;
        self.backend.assign_biophysics(&self.biophysics)?;

        tracing::debug!(section = section.0, nseg, "rediscretized section");

        Ok(())
    }

    /// Replaces the biophysics of the model
    pub fn set_biophysics(&mut self, biophysics: Biophysics) -> Result<(), CableNeuronError> {
        self.backend.assign_biophysics(&biophysics)?;
        self.biophysics = biophysics;

        Ok(())
    }

    /// Label for a probe such as `soma(0.5)`
    pub fn probe_label(&self, probe: &Probe) -> String {
        match self.morphology.section(probe.section) {
            Ok(section) => format!("{}({})", section.name, probe.location),
            Err(_) => probe.to_string(),
        }
    }

    /// Initializes, integrates to the stop time and returns an owned snapshot
    /// of every recorded trace
    pub fn run(&mut self, params: RunParameters) -> Result<Recording, CableNeuronError> {
        self.backend.initialize(params.v_init)?;
        self.backend.integrate_to(params.t_stop)?;

        self.snapshot()
    }

    /// Copies the traces recorded since the last initialization
    pub fn snapshot(&self) -> Result<Recording, CableNeuronError> {
        let traces = self.probes.iter()
            .map(|probe| {
                Ok(RecordedTrace {
                    label: self.probe_label(probe),
                    probe: *probe,
                    trace: self.backend.read_trace(probe)?,
                })
            })
            .collect::<Result<Vec<RecordedTrace>, CableNeuronError>>()?;

        Ok(Recording {
            time: self.backend.read_time(),
            traces,
        })
    }

    /// Initializes the backend without integrating
    pub fn initialize(&mut self, v_init: f64) -> Result<(), CableNeuronError> {
        self.backend.initialize(v_init)
    }

    /// Continues integration from the current time
    pub fn integrate_to(&mut self, t_stop: f64) -> Result<(), CableNeuronError> {
        self.backend.integrate_to(t_stop)
    }

    /// Current simulation time (ms)
    pub fn time(&self) -> f64 {
        self.backend.time()
    }
}
