//! Ball and stick neuron, an active spherical soma (length equal to diameter)
//! with a single passive dendrite attached at the soma's 1 end

use crate::biophysics::{Biophysics, SectionBiophysics};
use crate::engine::{Simulation, SimulationBackend};
use crate::error::CableNeuronError;
use crate::mechanisms::{HodgkinHuxley, Passive};
use crate::morphology::{Morphology, SectionEnd, SectionId};
use crate::recording::Probe;
use crate::stimulus::CurrentClamp;


/// Geometry and biophysics of a ball and stick cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellParameters {
    /// Soma length and diameter (µm)
    pub soma_size: f64,
    /// Dendrite length (µm)
    pub dend_length: f64,
    /// Dendrite diameter (µm)
    pub dend_diameter: f64,
    /// Number of dendrite segments
    pub dend_nseg: usize,
    /// Axial resistivity of every section (Ω·cm)
    pub ra: f64,
    /// Membrane capacitance of every section (µF/cm²)
    pub cm: f64,
    /// Somatic Hodgkin Huxley channels
    pub soma_hh: HodgkinHuxley,
    /// Dendritic leak
    pub dend_pas: Passive,
}

impl Default for CellParameters {
    fn default() -> Self {
        CellParameters {
            soma_size: 12.6157,
            dend_length: 200.,
            dend_diameter: 1.,
            dend_nseg: 1,
            ra: 100.,
            cm: 1.,
            soma_hh: HodgkinHuxley {
                gnabar: 0.12,
                gkbar: 0.036,
                gl: 0.0003,
                el: -54.3,
                ..HodgkinHuxley::default()
            },
            dend_pas: Passive {
                g: 0.001,
                e: -65.,
                ..Passive::default()
            },
        }
    }
}

/// Soma and dendrite morphology, the dendrite's 0 end connects to the soma's 1 end
pub fn build_morphology(params: &CellParameters) -> Result<(Morphology, SectionId, SectionId), CableNeuronError> {
    let mut morphology = Morphology::new();
    let soma = morphology.add_section("soma", params.soma_size, params.soma_size)?;
    let dend = morphology.add_section("dend", params.dend_length, params.dend_diameter)?;
    morphology.connect(dend, SectionEnd::Zero, soma, 1.)?;
    morphology.set_nseg(dend, params.dend_nseg)?;

    Ok((morphology, soma, dend))
}

/// Uniform `ra` and `cm`, Hodgkin Huxley channels on the soma and a passive leak on the dendrite
pub fn assign_biophysics(params: &CellParameters, soma: SectionId, dend: SectionId) -> Biophysics {
    let mut soma_biophysics = SectionBiophysics::new(params.ra, params.cm);
    soma_biophysics.insert(params.soma_hh);

    let mut dend_biophysics = SectionBiophysics::new(params.ra, params.cm);
    dend_biophysics.insert(params.dend_pas);

    let mut biophysics = Biophysics::new();
    biophysics.set(soma, soma_biophysics);
    biophysics.set(dend, dend_biophysics);

    biophysics
}

/// A ball and stick cell ready to be handed to a backend
#[derive(Debug, Clone)]
pub struct BallAndStick {
    /// Cell identifier
    pub gid: usize,
    pub morphology: Morphology,
    pub biophysics: Biophysics,
    pub soma: SectionId,
    pub dend: SectionId,
}

impl BallAndStick {
    /// Builds the cell with the default tutorial parameters
    pub fn new(gid: usize) -> Result<Self, CableNeuronError> {
        BallAndStick::from_parameters(gid, &CellParameters::default())
    }

    pub fn from_parameters(gid: usize, params: &CellParameters) -> Result<Self, CableNeuronError> {
        let (morphology, soma, dend) = build_morphology(params)?;
        let biophysics = assign_biophysics(params, soma, dend);
        biophysics.validate(&morphology)?;

        Ok(BallAndStick { gid, morphology, biophysics, soma, dend })
    }

    /// Probe at the middle of the soma
    pub fn soma_probe(&self) -> Probe {
        Probe::new(self.soma, 0.5)
    }

    /// Probe at the middle of the dendrite
    pub fn dend_probe(&self) -> Probe {
        Probe::new(self.dend, 0.5)
    }

    /// Builds the cell into a backend with probes at the soma and dendrite centers
    /// and the given current clamp
    pub fn into_simulation<B: SimulationBackend>(
        self,
        backend: B,
        stimulus: CurrentClamp,
    ) -> Result<Simulation<B>, CableNeuronError> {
        let soma_probe = self.soma_probe();
        let dend_probe = self.dend_probe();

        let mut simulation = Simulation::new(self.morphology, self.biophysics, backend)?;
        simulation.set_stimulus(stimulus)?;
        simulation.add_probe(soma_probe)?;
        simulation.add_probe(dend_probe)?;

        tracing::info!(gid = self.gid, "built ball and stick simulation");

        Ok(simulation)
    }
}

/// Stimulus parameters of the current clamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StimulusParameters {
    /// Normalized location along the dendrite
    pub location: f64,
    /// Onset (ms)
    pub delay: f64,
    /// Duration (ms)
    pub dur: f64,
    /// Amplitude (nA)
    pub amp: f64,
}

impl Default for StimulusParameters {
    fn default() -> Self {
        StimulusParameters {
            location: 1.,
            delay: 5.,
            dur: 1.,
            amp: 0.1,
        }
    }
}

impl StimulusParameters {
    /// Current clamp placed on the dendrite of `cell`
    pub fn on_dendrite(&self, cell: &BallAndStick) -> CurrentClamp {
        CurrentClamp {
            delay: self.delay,
            dur: self.dur,
            amp: self.amp,
            ..CurrentClamp::new(cell.dend, self.location)
        }
    }
}

impl std::fmt::Display for BallAndStick {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "BallAndStick[{}]", self.gid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soma_is_active_and_dendrite_passive() -> Result<(), CableNeuronError> {
        let cell = BallAndStick::new(0)?;

        assert_eq!(cell.biophysics.mechanism_names(cell.soma), vec!["hh"]);
        assert_eq!(cell.biophysics.mechanism_names(cell.dend), vec!["pas"]);
        assert_eq!(cell.to_string(), "BallAndStick[0]");

        Ok(())
    }

    #[test]
    fn test_geometry() -> Result<(), CableNeuronError> {
        let cell = BallAndStick::new(0)?;
        let soma = cell.morphology.section(cell.soma)?;
        let dend = cell.morphology.section(cell.dend)?;

        assert_eq!(soma.length, soma.diameter);
        assert_eq!(dend.length, 200.);
        assert_eq!(dend.diameter, 1.);

        let connection = dend.parent.expect("dendrite should be connected");
        assert_eq!(connection.parent, cell.soma);
        assert_eq!(connection.parent_location, 1.);
        assert_eq!(connection.child_end, SectionEnd::Zero);

        Ok(())
    }
}
