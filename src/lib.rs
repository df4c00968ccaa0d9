//! # Cable Neuron
//!
//! `cable_neuron` builds multicompartment neurons out of cylindrical sections,
//! assigns membrane mechanisms to them and integrates the cable equation over time.
//! Model construction is kept separate from numerical integration, a model is
//! described by a [`morphology::Morphology`] and a [`biophysics::Biophysics`]
//! and can be handed to anything implementing [`engine::SimulationBackend`].
//! The crate ships with a backward Euler solver ([`solver::CableSolver`]),
//! Hodgkin Huxley and passive membrane mechanisms, a current clamp, and
//! a ball and stick cell used to study how stimulus amplitude and dendritic
//! discretization shape somatic and dendritic voltage.
//!
//! ## Example Code
//!
//! ### Stimulating the dendrite of a ball and stick cell
//!
//! ```rust
//! use cable_neuron::{
//!     cell::{BallAndStick, StimulusParameters},
//!     engine::RunParameters,
//!     error::CableNeuronError,
//!     solver::CableSolver,
//! };
//!
//! fn main() -> Result<(), CableNeuronError> {
//!     let cell = BallAndStick::new(0)?;
//!     let soma = cell.soma_probe();
//!     let stimulus = StimulusParameters::default().on_dendrite(&cell);
//!
//!     let mut simulation = cell.into_simulation(CableSolver::default(), stimulus)?;
//!     let recording = simulation.run(RunParameters::default())?;
//!
//!     // one sample at initialization and one per step
//!     assert_eq!(recording.time.len(), 1001);
//!
//!     let soma_trace = recording.trace(&soma).expect("soma is recorded");
//!     assert_eq!(soma_trace.samples[0], -65.);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Sweeping stimulus amplitude
//!
//! ```rust
//! use cable_neuron::{
//!     cell::{BallAndStick, StimulusParameters},
//!     engine::RunParameters,
//!     error::CableNeuronError,
//!     solver::CableSolver,
//!     sweep::{run_sweep, tutorial_amplitudes, SweepPlan},
//! };
//!
//! fn main() -> Result<(), CableNeuronError> {
//!     let cell = BallAndStick::new(0)?;
//!     let stimulus = StimulusParameters::default().on_dendrite(&cell);
//!     let simulation = cell.into_simulation(CableSolver::default(), stimulus)?;
//!
//!     let plan = SweepPlan::amplitudes(tutorial_amplitudes());
//!     let results = run_sweep(&simulation, &plan, RunParameters::default())?;
//!
//!     assert_eq!(results.len(), 4);
//!     assert_eq!(results[0].label, "0.075");
//!
//!     Ok(())
//! }
//! ```

pub mod biophysics;
pub mod cell;
pub mod config;
pub mod engine;
pub mod error;
pub mod mechanisms;
pub mod morphology;
pub mod recording;
pub mod solver;
pub mod stimulus;
pub mod sweep;
