//! Repeated runs of a simulation across stimulus amplitudes and segment counts
//!
//! Every sweep point works on its own clone of the simulation context, so the
//! order points are evaluated in (or running them in parallel) cannot change
//! the recorded traces.

use std::{
    fs::{create_dir_all, File},
    io::BufWriter,
    path::Path,
};
use rayon::prelude::*;
use crate::engine::{RunParameters, Simulation, SimulationBackend};
use crate::error::CableNeuronError;
use crate::morphology::SectionId;
use crate::recording::Recording;


/// Amplitudes `0.075 * i` for `i` in `1..=4` (nA)
pub fn tutorial_amplitudes() -> Vec<f64> {
    (1..5).map(|i| 0.075 * i as f64).collect()
}

/// Finer amplitudes around threshold (nA)
pub fn fine_amplitudes() -> Vec<f64> {
    vec![0.02, 0.05, 0.075, 0.1, 0.15]
}

/// Dendrite segment counts compared when checking discretization
pub fn segment_counts() -> Vec<usize> {
    vec![1, 101]
}

/// Rounds to four decimal places for labelling
pub fn amplitude_label(amp: f64) -> String {
    format!("{}", (amp * 10_000.).round() / 10_000.)
}

/// A single sweep point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    /// Stimulus amplitude (nA)
    pub amplitude: f64,
    /// Segment count applied to the swept section, `None` keeps the current one
    pub nseg: Option<usize>,
}

/// Amplitudes crossed with optional segment counts of one section
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub amplitudes: Vec<f64>,
    /// Segment counts to try for every amplitude, empty to leave discretization alone
    pub nseg: Vec<usize>,
    /// Section whose segment count is swept
    pub section: Option<SectionId>,
}

impl SweepPlan {
    /// Sweeps amplitudes only
    pub fn amplitudes(amplitudes: Vec<f64>) -> Self {
        SweepPlan { amplitudes, nseg: vec![], section: None }
    }

    /// Sweeps amplitudes and, for each, every segment count of `section`
    pub fn amplitudes_and_segments(amplitudes: Vec<f64>, section: SectionId, nseg: Vec<usize>) -> Self {
        SweepPlan { amplitudes, nseg, section: Some(section) }
    }

    /// Points in evaluation order, segment counts vary fastest
    pub fn points(&self) -> Vec<SweepPoint> {
        match (self.section, self.nseg.is_empty()) {
            (Some(_), false) => self.amplitudes.iter()
                .flat_map(|amplitude| {
                    self.nseg.iter().map(move |nseg| SweepPoint { amplitude: *amplitude, nseg: Some(*nseg) })
                })
                .collect(),
            _ => self.amplitudes.iter()
                .map(|amplitude| SweepPoint { amplitude: *amplitude, nseg: None })
                .collect(),
        }
    }
}

/// Traces from one sweep point
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub point: SweepPoint,
    /// Amplitude rounded for display
    pub label: String,
    pub recording: Recording,
}

impl SweepResult {
    /// File name stem identifying the point
    pub fn file_stem(&self, tag: &str) -> String {
        match self.point.nseg {
            Some(nseg) => format!("{}_amp_{}_nseg_{}", tag, self.label, nseg),
            None => format!("{}_amp_{}", tag, self.label),
        }
    }
}

fn run_point<B: SimulationBackend>(
    simulation: &Simulation<B>,
    plan: &SweepPlan,
    point: SweepPoint,
    params: RunParameters,
) -> Result<SweepResult, CableNeuronError> {
    let mut simulation = simulation.clone();
    simulation.set_amplitude(point.amplitude)?;
    if let (Some(section), Some(nseg)) = (plan.section, point.nseg) {
        simulation.set_nseg(section, nseg)?;
    }

    let recording = simulation.run(params)?;

    tracing::debug!(amplitude = point.amplitude, nseg = ?point.nseg, "finished sweep point");

    Ok(SweepResult {
        point,
        label: amplitude_label(point.amplitude),
        recording,
    })
}

/// Runs every point of the plan one after another, the given
/// simulation is left untouched
pub fn run_sweep<B: SimulationBackend>(
    simulation: &Simulation<B>,
    plan: &SweepPlan,
    params: RunParameters,
) -> Result<Vec<SweepResult>, CableNeuronError> {
    let points = plan.points();
    tracing::info!(points = points.len(), "running sweep");

    points.into_iter()
        .map(|point| run_point(simulation, plan, point, params))
        .collect()
}

/// Runs every point of the plan on the rayon thread pool,
/// results are returned in plan order
pub fn run_sweep_parallel<B: SimulationBackend + Sync>(
    simulation: &Simulation<B>,
    plan: &SweepPlan,
    params: RunParameters,
) -> Result<Vec<SweepResult>, CableNeuronError> {
    let points = plan.points();
    tracing::info!(points = points.len(), "running sweep in parallel");

    points.into_par_iter()
        .map(|point| run_point(simulation, plan, point, params))
        .collect()
}

/// Writes one csv file per sweep result into `directory`
pub fn write_csv(results: &[SweepResult], directory: &Path, tag: &str) -> Result<(), CableNeuronError> {
    create_dir_all(directory)?;

    for result in results {
        let path = directory.join(format!("{}.csv", result.file_stem(tag)));
        let mut file = BufWriter::new(File::create(&path)?);
        result.recording.write_csv(&mut file)?;

        tracing::info!(path = %path.display(), "wrote sweep output");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_rounded() {
        let labels: Vec<String> = tutorial_amplitudes().into_iter()
            .map(amplitude_label)
            .collect();

        assert_eq!(labels, vec!["0.075", "0.15", "0.225", "0.3"]);
    }

    #[test]
    fn test_points_order() {
        let plan = SweepPlan::amplitudes_and_segments(vec![0.1, 0.2], SectionId(1), segment_counts());
        let points = plan.points();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0], SweepPoint { amplitude: 0.1, nseg: Some(1) });
        assert_eq!(points[1], SweepPoint { amplitude: 0.1, nseg: Some(101) });
        assert_eq!(points[2], SweepPoint { amplitude: 0.2, nseg: Some(1) });

        let plan = SweepPlan::amplitudes(fine_amplitudes());
        assert!(plan.points().iter().all(|point| point.nseg.is_none()));
    }
}
