//! Reading run descriptions from `.toml` files
//!
//! Every field is optional and falls back to the ball and stick tutorial values,
//! an example:
//!
//! ```toml
//! [simulation]
//! tag = "ball_and_stick"
//! dt = 0.025
//! v_init = -65.0
//! t_stop = 25.0
//! output_directory = "output"
//! parallel = false
//!
//! [cell]
//! dend_nseg = 1
//!
//! [cell.hh]
//! gnabar = 0.12
//!
//! [cell.pas]
//! g = 0.001
//! e = -65.0
//!
//! [stimulus]
//! location = 1.0
//! delay = 5.0
//! dur = 1.0
//! amp = 0.1
//!
//! [[sweep]]
//! name = "segments"
//! preset = "tutorial"
//! nseg = [1, 101]
//! ```

use std::{fs::read_to_string, path::{Path, PathBuf}};
use toml::Value;
use crate::cell::{CellParameters, StimulusParameters};
use crate::engine::RunParameters;
use crate::error::ConfigError;
use crate::solver::DEFAULT_DT;
use crate::sweep::{fine_amplitudes, segment_counts, tutorial_amplitudes};


fn parse_bool(value: &Value, field_name: &str) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| ConfigError::InvalidField(format!("{} as boolean", field_name)))
}

fn parse_usize(value: &Value, field_name: &str) -> Result<usize, ConfigError> {
    value
        .as_integer()
        .filter(|v| *v >= 0)
        .ok_or_else(|| ConfigError::InvalidField(format!("{} as unsigned integer", field_name)))
        .map(|v| v as usize)
}

// integers are accepted so `t_stop = 25` reads the same as `t_stop = 25.0`
fn parse_f64(value: &Value, field_name: &str) -> Result<f64, ConfigError> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|v| v as f64))
        .ok_or_else(|| ConfigError::InvalidField(format!("{} as float", field_name)))
}

fn parse_string(value: &Value, field_name: &str) -> Result<String, ConfigError> {
    value
        .as_str()
        .ok_or_else(|| ConfigError::InvalidField(format!("{} as string", field_name)))
        .map(String::from)
}

fn parse_array<T>(
    value: &Value,
    field_name: &str,
    parser: impl Fn(&Value, &str) -> Result<T, ConfigError>,
) -> Result<Vec<T>, ConfigError> {
    value
        .as_array()
        .ok_or_else(|| ConfigError::InvalidField(format!("{} as array", field_name)))?
        .iter()
        .map(|i| parser(i, field_name))
        .collect()
}

fn parse_value_with_default<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> Result<T, ConfigError>,
    default: T,
) -> Result<T, ConfigError> {
    table
        .get(key)
        .map_or(Ok(default), |value| parser(value, key))
}

/// Amplitudes and segment counts of one sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Name used to prefix output files
    pub name: String,
    /// Stimulus amplitudes (nA)
    pub amplitudes: Vec<f64>,
    /// Dendrite segment counts, empty to keep the cell's
    pub nseg: Vec<usize>,
}

/// Everything needed to run the scenario and its sweeps
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Prefix for output files
    pub tag: String,
    /// Timestep (ms)
    pub dt: f64,
    pub run: RunParameters,
    pub output_directory: PathBuf,
    /// Whether sweeps use the rayon thread pool
    pub parallel: bool,
    pub cell: CellParameters,
    pub stimulus: StimulusParameters,
    pub sweeps: Vec<SweepConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            tag: String::from("ball_and_stick"),
            dt: DEFAULT_DT,
            run: RunParameters::default(),
            output_directory: PathBuf::from("output"),
            parallel: false,
            cell: CellParameters::default(),
            stimulus: StimulusParameters::default(),
            sweeps: vec![
                SweepConfig {
                    name: String::from("amplitudes"),
                    amplitudes: tutorial_amplitudes(),
                    nseg: vec![],
                },
                SweepConfig {
                    name: String::from("fine_amplitudes"),
                    amplitudes: fine_amplitudes(),
                    nseg: vec![],
                },
                SweepConfig {
                    name: String::from("segments"),
                    amplitudes: tutorial_amplitudes(),
                    nseg: segment_counts(),
                },
            ],
        }
    }
}

fn get_cell_params(table: &Value) -> Result<CellParameters, ConfigError> {
    let defaults = CellParameters::default();
    let mut cell = defaults;

    cell.soma_size = parse_value_with_default(table, "soma_size", parse_f64, defaults.soma_size)?;
    cell.dend_length = parse_value_with_default(table, "dend_length", parse_f64, defaults.dend_length)?;
    cell.dend_diameter = parse_value_with_default(table, "dend_diameter", parse_f64, defaults.dend_diameter)?;
    cell.dend_nseg = parse_value_with_default(table, "dend_nseg", parse_usize, defaults.dend_nseg)?;
    cell.ra = parse_value_with_default(table, "ra", parse_f64, defaults.ra)?;
    cell.cm = parse_value_with_default(table, "cm", parse_f64, defaults.cm)?;

    if let Some(hh) = table.get("hh") {
        let soma_hh = &mut cell.soma_hh;
        soma_hh.gnabar = parse_value_with_default(hh, "gnabar", parse_f64, soma_hh.gnabar)?;
        soma_hh.gkbar = parse_value_with_default(hh, "gkbar", parse_f64, soma_hh.gkbar)?;
        soma_hh.gl = parse_value_with_default(hh, "gl", parse_f64, soma_hh.gl)?;
        soma_hh.el = parse_value_with_default(hh, "el", parse_f64, soma_hh.el)?;
        soma_hh.ena = parse_value_with_default(hh, "ena", parse_f64, soma_hh.ena)?;
        soma_hh.ek = parse_value_with_default(hh, "ek", parse_f64, soma_hh.ek)?;
        soma_hh.celsius = parse_value_with_default(hh, "celsius", parse_f64, soma_hh.celsius)?;
    }

    if let Some(pas) = table.get("pas") {
        cell.dend_pas.g = parse_value_with_default(pas, "g", parse_f64, cell.dend_pas.g)?;
        cell.dend_pas.e = parse_value_with_default(pas, "e", parse_f64, cell.dend_pas.e)?;
    }

    tracing::debug!(?cell, "cell parameters");

    Ok(cell)
}

fn get_stimulus_params(table: &Value) -> Result<StimulusParameters, ConfigError> {
    let defaults = StimulusParameters::default();

    let stimulus = StimulusParameters {
        location: parse_value_with_default(table, "location", parse_f64, defaults.location)?,
        delay: parse_value_with_default(table, "delay", parse_f64, defaults.delay)?,
        dur: parse_value_with_default(table, "dur", parse_f64, defaults.dur)?,
        amp: parse_value_with_default(table, "amp", parse_f64, defaults.amp)?,
    };

    tracing::debug!(?stimulus, "stimulus parameters");

    Ok(stimulus)
}

fn get_sweep_config(table: &Value, index: usize) -> Result<SweepConfig, ConfigError> {
    let name = parse_value_with_default(table, "name", parse_string, format!("sweep_{}", index))?;

    let amplitudes = match (table.get("amplitudes"), table.get("preset")) {
        (Some(value), _) => parse_array(value, "amplitudes", parse_f64)?,
        (None, Some(preset)) => match parse_string(preset, "preset")?.as_str() {
            "tutorial" => tutorial_amplitudes(),
            "fine" => fine_amplitudes(),
            other => return Err(ConfigError::InvalidField(format!("preset '{}'", other))),
        },
        (None, None) => return Err(ConfigError::MissingField(String::from("amplitudes"))),
    };

    let nseg = match table.get("nseg") {
        Some(value) => parse_array(value, "nseg", parse_usize)?,
        None => vec![],
    };

    tracing::debug!(name = %name, ?amplitudes, ?nseg, "sweep");

    Ok(SweepConfig { name, amplitudes, nseg })
}

impl RunConfig {
    /// Parses a run description from toml text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Value = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        let defaults = RunConfig::default();

        let empty = Value::Table(toml::map::Map::new());
        let simulation_table = config.get("simulation").unwrap_or(&empty);

        let tag = parse_value_with_default(simulation_table, "tag", parse_string, defaults.tag)?;
        let dt = parse_value_with_default(simulation_table, "dt", parse_f64, defaults.dt)?;
        let run = RunParameters {
            v_init: parse_value_with_default(simulation_table, "v_init", parse_f64, defaults.run.v_init)?,
            t_stop: parse_value_with_default(simulation_table, "t_stop", parse_f64, defaults.run.t_stop)?,
        };
        let output_directory = parse_value_with_default(
            simulation_table,
            "output_directory",
            parse_string,
            String::from("output"),
        )?;
        let parallel = parse_value_with_default(simulation_table, "parallel", parse_bool, defaults.parallel)?;

        tracing::info!(tag = %tag, dt, v_init = run.v_init, t_stop = run.t_stop, "simulation settings");

        let cell = match config.get("cell") {
            Some(table) => get_cell_params(table)?,
            None => defaults.cell,
        };
        let stimulus = match config.get("stimulus") {
            Some(table) => get_stimulus_params(table)?,
            None => defaults.stimulus,
        };
        let sweeps = match config.get("sweep") {
            Some(value) => value
                .as_array()
                .ok_or_else(|| ConfigError::InvalidField(String::from("sweep as array of tables")))?
                .iter()
                .enumerate()
                .map(|(n, table)| get_sweep_config(table, n))
                .collect::<Result<Vec<SweepConfig>, ConfigError>>()?,
            None => defaults.sweeps,
        };

        Ok(RunConfig {
            tag,
            dt,
            run,
            output_directory: PathBuf::from(output_directory),
            parallel,
            cell,
            stimulus,
            sweeps,
        })
    }

    /// Reads and parses a `.toml` file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        RunConfig::from_toml(&content)
    }
}
