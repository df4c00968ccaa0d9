//! Fixed step cable equation solver
//!
//! Every segment is a single node placed at the segment center. Neighboring
//! nodes are coupled through the axial resistance between their centers, the
//! first node of a child section couples to the parent segment containing the
//! connection point. Voltages are advanced with backward Euler using membrane
//! currents linearized around the voltage at the start of the step, which
//! gives a tree shaped linear system solved exactly by Hines elimination
//! (every node is numbered after its parent). Gating states are advanced
//! afterwards at the new voltage.

use ndarray::Array1;
use crate::engine::SimulationBackend;
use crate::error::{CableNeuronError, MorphologyError, SimulationError};
use crate::biophysics::Biophysics;
use crate::mechanisms::DensityMechanism;
use crate::morphology::{Morphology, SectionEnd, SectionId};
use crate::recording::{Probe, Trace};
use crate::stimulus::CurrentClamp;


/// Default timestep (ms)
pub const DEFAULT_DT: f64 = 0.025;

/// Most steps a single call to `integrate_to` will take
pub const MAX_STEPS: usize = 100_000_000;

#[derive(Debug, Clone, Copy)]
struct SectionLayout {
    first: usize,
    nseg: usize,
    // child attached at its 1 end, nodes run from x = 1 towards x = 0
    reversed: bool,
}

impl SectionLayout {
    fn node(&self, segment: usize) -> usize {
        if self.reversed {
            self.first + (self.nseg - 1 - segment)
        } else {
            self.first + segment
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    section: SectionId,
    parent: Option<usize>,
    // membrane area (cm²)
    area: f64,
    // specific capacitance (µF/cm²)
    cm: f64,
    // coupling to parent as seen from this node's row (mA/cm² per mV)
    g_to_parent: f64,
    // coupling to this node as seen from the parent's row (mA/cm² per mV)
    g_from_parent: f64,
    mechanisms: Vec<Box<dyn DensityMechanism>>,
}

/// Backward Euler cable solver for branched morphologies
#[derive(Debug, Clone)]
pub struct CableSolver {
    dt: f64,
    morphology: Option<Morphology>,
    layout: Vec<SectionLayout>,
    nodes: Vec<Node>,
    biophysics_assigned: bool,
    stimulus: Option<CurrentClamp>,
    stimulus_node: Option<usize>,
    probes: Vec<Probe>,
    probe_nodes: Vec<usize>,
    initialized: bool,
    step_count: usize,
    voltages: Array1<f64>,
    diagonal: Array1<f64>,
    rhs: Array1<f64>,
    lower: Array1<f64>,
    upper: Array1<f64>,
    time_buffer: Vec<f64>,
    trace_buffers: Vec<Vec<f64>>,
}

impl Default for CableSolver {
    fn default() -> Self {
        CableSolver {
            dt: DEFAULT_DT,
            morphology: None,
            layout: vec![],
            nodes: vec![],
            biophysics_assigned: false,
            stimulus: None,
            stimulus_node: None,
            probes: vec![],
            probe_nodes: vec![],
            initialized: false,
            step_count: 0,
            voltages: Array1::zeros(0),
            diagonal: Array1::zeros(0),
            rhs: Array1::zeros(0),
            lower: Array1::zeros(0),
            upper: Array1::zeros(0),
            time_buffer: vec![],
            trace_buffers: vec![],
        }
    }
}

impl CableSolver {
    /// Creates a solver with the given timestep (ms)
    pub fn new(dt: f64) -> Result<Self, SimulationError> {
        let mut solver = CableSolver::default();
        solver.set_dt(dt)?;

        Ok(solver)
    }

    /// Timestep (ms)
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Changes the timestep, the solver must be initialized again afterwards
    pub fn set_dt(&mut self, dt: f64) -> Result<(), SimulationError> {
        if !(dt.is_finite() && dt > 0.) {
            return Err(SimulationError::InvalidTimestep(dt));
        }
        self.dt = dt;
        self.initialized = false;

        Ok(())
    }

    /// Number of nodes (segments) in the built model
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Current voltage of every node (mV)
    pub fn voltages(&self) -> &Array1<f64> {
        &self.voltages
    }

    /// Number of steps taken since initialization
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    fn built_morphology(&self) -> Result<&Morphology, SimulationError> {
        self.morphology.as_ref().ok_or(SimulationError::MorphologyNotBuilt)
    }

    fn node_at(&self, section: SectionId, location: f64) -> Result<usize, CableNeuronError> {
        let morphology = self.built_morphology()?;
        let layout = self.layout.get(section.0)
            .ok_or_else(|| MorphologyError::SectionNotFound(format!("#{}", section.0)))?;
        let segment = morphology.section(section)?.segment_index(location);

        Ok(layout.node(segment))
    }

    fn record_sample(&mut self) {
        self.time_buffer.push(self.time());
        for (buffer, node) in self.trace_buffers.iter_mut().zip(self.probe_nodes.iter()) {
            buffer.push(self.voltages[*node]);
        }
    }

    fn section_name(&self, section: SectionId) -> String {
        self.morphology.as_ref()
            .and_then(|morphology| morphology.section(section).ok())
            .map(|section| section.name.clone())
            .unwrap_or_else(|| format!("#{}", section.0))
    }

    /// Advances the model by a single timestep
    pub fn step(&mut self) -> Result<(), CableNeuronError> {
        if !self.initialized {
            return Err(SimulationError::NotInitialized.into());
        }

        let dt = self.dt;
        let t_mid = self.time() + dt / 2.;

        for (index, node) in self.nodes.iter_mut().enumerate() {
            let v = self.voltages[index];
            let mut i_ion = 0.;
            let mut g_ion = 0.;
            for mechanism in node.mechanisms.iter_mut() {
                mechanism.update_current(v);
                i_ion += mechanism.get_current();
                g_ion += mechanism.get_conductance();
            }

            // µF/cm² · mV/ms = 1e-3 mA/cm²
            self.diagonal[index] = 1e-3 * node.cm / dt + g_ion;
            self.rhs[index] = -i_ion;
        }

        if let (Some(stimulus), Some(node)) = (self.stimulus, self.stimulus_node) {
            // nA to mA per cm² of segment membrane
            self.rhs[node] += stimulus.current_at(t_mid) * 1e-6 / self.nodes[node].area;
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                let dv = self.voltages[parent] - self.voltages[index];
                self.rhs[index] += node.g_to_parent * dv;
                self.rhs[parent] -= node.g_from_parent * dv;
                self.diagonal[index] += node.g_to_parent;
                self.diagonal[parent] += node.g_from_parent;
                self.lower[index] = -node.g_to_parent;
                self.upper[index] = -node.g_from_parent;
            }
        }

        // eliminate children into parents, leaves first
        for index in (0..self.nodes.len()).rev() {
            if let Some(parent) = self.nodes[index].parent {
                let factor = self.upper[index] / self.diagonal[index];
                self.diagonal[parent] -= factor * self.lower[index];
                self.rhs[parent] -= factor * self.rhs[index];
            }
        }

        // back substitute from roots, rhs becomes the voltage change
        for index in 0..self.nodes.len() {
            let coupled = match self.nodes[index].parent {
                Some(parent) => self.lower[index] * self.rhs[parent],
                None => 0.,
            };
            self.rhs[index] = (self.rhs[index] - coupled) / self.diagonal[index];
        }

        self.voltages += &self.rhs;

        if let Some(index) = self.voltages.iter().position(|v| !v.is_finite()) {
            let section = self.section_name(self.nodes[index].section);
            self.initialized = false;

            return Err(SimulationError::NonFiniteVoltage { section, t: t_mid + dt / 2. }.into());
        }

        for (index, node) in self.nodes.iter_mut().enumerate() {
            let v = self.voltages[index];
            for mechanism in node.mechanisms.iter_mut() {
                mechanism.update_states(v, dt);
            }
        }

        self.step_count += 1;
        self.record_sample();

        Ok(())
    }
}

impl SimulationBackend for CableSolver {
    fn build_morphology(&mut self, morphology: &Morphology) -> Result<(), CableNeuronError> {
        let mut layout = vec![
            SectionLayout { first: 0, nseg: 0, reversed: false };
            morphology.sections().len()
        ];
        let mut nodes: Vec<Node> = Vec::with_capacity(morphology.total_segments());

        for id in morphology.topological_order() {
            let section = morphology.section(id)?;
            if section.nseg == 0 {
                return Err(MorphologyError::InvalidSegmentCount(section.name.clone()).into());
            }

            let reversed = matches!(
                section.parent,
                Some(connection) if connection.child_end == SectionEnd::One
            );
            let section_layout = SectionLayout { first: nodes.len(), nseg: section.nseg, reversed };

            let attachment = match section.parent {
                Some(connection) => {
                    let parent_section = morphology.section(connection.parent)?;
                    let parent_segment = parent_section.segment_index(connection.parent_location);
                    Some(layout[connection.parent.0].node(parent_segment))
                },
                None => None,
            };

            for k in 0..section.nseg {
                let parent = if k == 0 { attachment } else { Some(section_layout.first + k - 1) };
                nodes.push(Node {
                    section: id,
                    parent,
                    area: section.segment_area(),
                    cm: 0.,
                    g_to_parent: 0.,
                    g_from_parent: 0.,
                    mechanisms: vec![],
                });
            }

            layout[id.0] = section_layout;
        }

        let n = nodes.len();
        self.layout = layout;
        self.nodes = nodes;
        self.morphology = Some(morphology.clone());
        self.biophysics_assigned = false;
        self.initialized = false;
        self.step_count = 0;
        self.voltages = Array1::zeros(n);
        self.diagonal = Array1::zeros(n);
        self.rhs = Array1::zeros(n);
        self.lower = Array1::zeros(n);
        self.upper = Array1::zeros(n);
        self.time_buffer.clear();
        self.trace_buffers.iter_mut().for_each(|buffer| buffer.clear());

        tracing::debug!(sections = morphology.sections().len(), nodes = n, "built morphology");

        Ok(())
    }

    fn assign_biophysics(&mut self, biophysics: &Biophysics) -> Result<(), CableNeuronError> {
        let morphology = self.built_morphology()?.clone();
        biophysics.validate(&morphology)?;

        for index in 0..self.nodes.len() {
            let id = self.nodes[index].section;
            let section = morphology.section(id)?;
            let section_biophysics = biophysics.get(id)
                .ok_or(SimulationError::BiophysicsNotAssigned)?;

            let resistance = match self.nodes[index].parent {
                Some(parent) if self.nodes[parent].section == id => {
                    section.axial_resistance(section_biophysics.ra, section.segment_length())
                },
                Some(parent) => {
                    let parent_id = self.nodes[parent].section;
                    let parent_section = morphology.section(parent_id)?;
                    let parent_ra = biophysics.get(parent_id)
                        .ok_or(SimulationError::BiophysicsNotAssigned)?
                        .ra;
                    let location = section.parent.map_or(0.5, |connection| connection.parent_location);
                    let center = parent_section.segment_centers()[parent_section.segment_index(location)];

                    section.axial_resistance(section_biophysics.ra, section.segment_length() / 2.)
                        + parent_section.axial_resistance(parent_ra, (location - center).abs() * parent_section.length)
                },
                None => f64::INFINITY,
            };

            let area = self.nodes[index].area;
            let parent_area = self.nodes[index].parent.map_or(area, |parent| self.nodes[parent].area);

            let node = &mut self.nodes[index];
            node.cm = section_biophysics.cm;
            node.mechanisms = section_biophysics.mechanisms.clone();
            // mV / MΩ = nA, nA to mA is 1e-6
            node.g_to_parent = 1e-6 / (resistance * area);
            node.g_from_parent = 1e-6 / (resistance * parent_area);
        }

        self.biophysics_assigned = true;
        self.initialized = false;

        tracing::debug!(nodes = self.nodes.len(), "assigned biophysics");

        Ok(())
    }

    fn configure_stimulus(&mut self, stimulus: Option<&CurrentClamp>) -> Result<(), CableNeuronError> {
        if let Some(clamp) = stimulus {
            clamp.validate()?;
            if let Some(morphology) = &self.morphology {
                morphology.section(clamp.section)?;
            }
        }
        self.stimulus = stimulus.copied();

        Ok(())
    }

    fn record(&mut self, probe: Probe) -> Result<(), CableNeuronError> {
        if !(0. ..=1.).contains(&probe.location) {
            return Err(MorphologyError::LocationOutOfRange(probe.location).into());
        }
        if let Some(morphology) = &self.morphology {
            morphology.section(probe.section)?;
        }
        if !self.probes.contains(&probe) {
            self.probes.push(probe);
            self.trace_buffers.push(vec![]);
            self.initialized = false;
        }

        Ok(())
    }

    fn initialize(&mut self, v_init: f64) -> Result<(), CableNeuronError> {
        self.built_morphology()?;
        if !self.biophysics_assigned {
            return Err(SimulationError::BiophysicsNotAssigned.into());
        }
        if !v_init.is_finite() {
            return Err(SimulationError::InvalidInitialVoltage(v_init).into());
        }

        self.stimulus_node = match self.stimulus {
            Some(clamp) => Some(self.node_at(clamp.section, clamp.location)?),
            None => None,
        };
        self.probe_nodes = self.probes.iter()
            .map(|probe| self.node_at(probe.section, probe.location))
            .collect::<Result<Vec<usize>, CableNeuronError>>()?;

        self.voltages.fill(v_init);
        self.lower.fill(0.);
        self.upper.fill(0.);
        for node in self.nodes.iter_mut() {
            for mechanism in node.mechanisms.iter_mut() {
                mechanism.initialize(v_init);
            }
        }

        self.step_count = 0;
        self.time_buffer.clear();
        self.trace_buffers.iter_mut().for_each(|buffer| buffer.clear());
        self.initialized = true;
        self.record_sample();

        Ok(())
    }

    fn integrate_to(&mut self, t_stop: f64) -> Result<(), CableNeuronError> {
        if !self.initialized {
            return Err(SimulationError::NotInitialized.into());
        }

        let t = self.time();
        // only allows for rounding in the accumulated time
        if !t_stop.is_finite() || t_stop < t - 1e-9 * self.dt {
            return Err(SimulationError::StopTimeBeforeCurrentTime { t_stop, t }.into());
        }

        let requested = ((t_stop - t) / self.dt).round().max(0.);
        if requested > MAX_STEPS as f64 {
            return Err(SimulationError::TooManySteps { t_stop, max: MAX_STEPS }.into());
        }
        let steps = requested as usize;
        self.time_buffer.reserve(steps);
        self.trace_buffers.iter_mut().for_each(|buffer| buffer.reserve(steps));

        for _ in 0..steps {
            self.step()?;
        }

        tracing::debug!(t = self.time(), steps, "integrated");

        Ok(())
    }

    fn read_trace(&self, probe: &Probe) -> Result<Trace, CableNeuronError> {
        self.probes.iter()
            .position(|i| i == probe)
            .map(|index| Trace::new(self.trace_buffers[index].clone()))
            .ok_or_else(|| SimulationError::ProbeNotRecorded(probe.to_string()).into())
    }

    fn read_time(&self) -> Vec<f64> {
        self.time_buffer.clone()
    }

    fn time(&self) -> f64 {
        self.step_count as f64 * self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biophysics::SectionBiophysics;
    use crate::mechanisms::Passive;

    fn passive_cable(nseg: usize) -> (Morphology, Biophysics, SectionId) {
        let mut morphology = Morphology::new();
        let cable = morphology.add_section("cable", 100., 2.).unwrap();
        morphology.set_nseg(cable, nseg).unwrap();

        let mut section = SectionBiophysics::new(100., 1.);
        section.insert(Passive { g: 0.001, e: -65., ..Passive::default() });

        let mut biophysics = Biophysics::new();
        biophysics.set(cable, section);

        (morphology, biophysics, cable)
    }

    #[test]
    fn test_passive_rest_is_stationary() -> Result<(), CableNeuronError> {
        let (morphology, biophysics, cable) = passive_cable(5);
        let mut solver = CableSolver::default();
        solver.build_morphology(&morphology)?;
        solver.assign_biophysics(&biophysics)?;
        solver.record(Probe::new(cable, 0.5))?;
        solver.initialize(-65.)?;
        solver.integrate_to(10.)?;

        let trace = solver.read_trace(&Probe::new(cable, 0.5))?;
        assert_eq!(trace.len(), 401);
        assert!(trace.samples.iter().all(|v| (*v + 65.).abs() < 1e-12));

        Ok(())
    }

    #[test]
    fn test_single_node_matches_analytic_relaxation() -> Result<(), CableNeuronError> {
        let (morphology, biophysics, cable) = passive_cable(1);
        let mut solver = CableSolver::new(0.001)?;
        solver.build_morphology(&morphology)?;
        solver.assign_biophysics(&biophysics)?;
        solver.record(Probe::new(cable, 0.5))?;
        solver.initialize(-55.)?;
        solver.integrate_to(1.)?;

        // tau = cm / g = 1 ms
        let expected = -65. + 10. * (-1_f64).exp();
        let trace = solver.read_trace(&Probe::new(cable, 0.5))?;
        let last = trace.samples[trace.len() - 1];
        assert!((last - expected).abs() < 1e-2, "{} vs {}", last, expected);

        Ok(())
    }

    #[test]
    fn test_injected_charge_spreads_along_cable() -> Result<(), CableNeuronError> {
        let (morphology, biophysics, cable) = passive_cable(11);
        let mut solver = CableSolver::default();
        solver.build_morphology(&morphology)?;
        solver.assign_biophysics(&biophysics)?;

        let clamp = CurrentClamp { delay: 1., dur: 1., amp: 0.1, ..CurrentClamp::new(cable, 0.) };
        solver.configure_stimulus(Some(&clamp))?;
        solver.record(Probe::new(cable, 0.))?;
        solver.record(Probe::new(cable, 1.))?;
        solver.initialize(-65.)?;
        solver.integrate_to(5.)?;

        let near = solver.read_trace(&Probe::new(cable, 0.))?.peak().map(|(_, v)| v).unwrap_or(-65.);
        let far = solver.read_trace(&Probe::new(cable, 1.))?.peak().map(|(_, v)| v).unwrap_or(-65.);
        assert!(near > far);
        assert!(far > -65.);

        Ok(())
    }

    #[test]
    fn test_integrate_requires_initialization() {
        let (morphology, biophysics, _) = passive_cable(1);
        let mut solver = CableSolver::default();
        solver.build_morphology(&morphology).unwrap();
        solver.assign_biophysics(&biophysics).unwrap();

        assert!(matches!(
            solver.integrate_to(1.),
            Err(CableNeuronError::SimulationRelatedError(SimulationError::NotInitialized))
        ));
    }

    #[test]
    fn test_stop_time_before_current_time() -> Result<(), CableNeuronError> {
        let (morphology, biophysics, _) = passive_cable(1);
        let mut solver = CableSolver::default();
        solver.build_morphology(&morphology)?;
        solver.assign_biophysics(&biophysics)?;
        solver.initialize(-65.)?;
        solver.integrate_to(2.)?;

        assert!(matches!(
            solver.integrate_to(1.),
            Err(CableNeuronError::SimulationRelatedError(SimulationError::StopTimeBeforeCurrentTime { .. }))
        ));

        // continuing to the same time is a no-op
        solver.integrate_to(2.)?;
        assert_eq!(solver.step_count(), 80);

        // a quarter step back is still earlier
        assert!(matches!(
            solver.integrate_to(2. - DEFAULT_DT / 4.),
            Err(CableNeuronError::SimulationRelatedError(SimulationError::StopTimeBeforeCurrentTime { .. }))
        ));
        assert_eq!(solver.step_count(), 80);

        Ok(())
    }

    #[test]
    fn test_huge_stop_time_is_rejected() -> Result<(), CableNeuronError> {
        let (morphology, biophysics, cable) = passive_cable(1);
        let mut solver = CableSolver::default();
        solver.build_morphology(&morphology)?;
        solver.assign_biophysics(&biophysics)?;
        solver.record(Probe::new(cable, 0.5))?;
        solver.initialize(-65.)?;

        assert!(matches!(
            solver.integrate_to(1e30),
            Err(CableNeuronError::SimulationRelatedError(SimulationError::TooManySteps { .. }))
        ));

        // nothing was integrated and the solver is still usable
        assert_eq!(solver.step_count(), 0);
        solver.integrate_to(1.)?;
        assert_eq!(solver.read_time().len(), 41);

        Ok(())
    }

    #[test]
    fn test_invalid_timestep() {
        assert!(matches!(CableSolver::new(0.), Err(SimulationError::InvalidTimestep(_))));
        assert!(matches!(CableSolver::new(f64::NAN), Err(SimulationError::InvalidTimestep(_))));
    }
}
