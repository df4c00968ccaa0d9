use std::fmt::{Display, Debug, Formatter, Result};


/// Error set for invalid morphology construction
pub enum MorphologyError {
    /// Section name is not present in the morphology
    SectionNotFound(String),
    /// Section name already used in the morphology
    DuplicateSection(String),
    /// Length or diameter must be finite and greater than zero
    InvalidGeometry(String),
    /// Sections must be discretized into at least one segment
    InvalidSegmentCount(String),
    /// Normalized locations must be within `[0, 1]`
    LocationOutOfRange(f64),
    /// Section already has a parent (a section can only have one parent)
    AlreadyConnected(String),
    /// Section cannot be connected to itself or one of its descendants
    CyclicConnection(String),
}

impl Display for MorphologyError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            MorphologyError::SectionNotFound(name) => write!(f, "Section '{}' not found", name),
            MorphologyError::DuplicateSection(name) => write!(f, "Section '{}' already present in morphology", name),
            MorphologyError::InvalidGeometry(name) => write!(
                f, "Section '{}' must have finite, positive length and diameter", name
            ),
            MorphologyError::InvalidSegmentCount(name) => write!(f, "Section '{}' must have at least one segment", name),
            MorphologyError::LocationOutOfRange(x) => write!(f, "Location {} must be within [0, 1]", x),
            MorphologyError::AlreadyConnected(name) => write!(f, "Section '{}' already has a parent", name),
            MorphologyError::CyclicConnection(name) => write!(f, "Connecting section '{}' would create a cycle", name),
        }
    }
}

impl Debug for MorphologyError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for invalid biophysical parameters
pub enum BiophysicsError {
    /// Axial resistance must be finite and positive
    InvalidAxialResistance(String),
    /// Membrane capacitance must be finite and positive
    InvalidCapacitance(String),
    /// Conductance densities must be finite and non-negative
    InvalidConductance(String),
    /// Section has no biophysics assigned
    BiophysicsNotAssigned(String),
}

impl Display for BiophysicsError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            BiophysicsError::InvalidAxialResistance(name) => write!(
                f, "Section '{}' must have a finite, positive axial resistance", name
            ),
            BiophysicsError::InvalidCapacitance(name) => write!(
                f, "Section '{}' must have a finite, positive membrane capacitance", name
            ),
            BiophysicsError::InvalidConductance(name) => write!(
                f, "Mechanism '{}' must have finite, non-negative conductances", name
            ),
            BiophysicsError::BiophysicsNotAssigned(name) => write!(f, "Section '{}' has no biophysics assigned", name),
        }
    }
}

impl Debug for BiophysicsError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for current clamp configuration
pub enum StimulusError {
    /// Delay must be finite and non-negative
    InvalidDelay,
    /// Duration must be finite and non-negative
    InvalidDuration,
    /// Amplitude must be finite
    InvalidAmplitude,
}

impl Display for StimulusError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let err_msg = match self {
            StimulusError::InvalidDelay => "Stimulus delay must be finite and non-negative",
            StimulusError::InvalidDuration => "Stimulus duration must be finite and non-negative",
            StimulusError::InvalidAmplitude => "Stimulus amplitude must be finite",
        };

        write!(f, "{}", err_msg)
    }
}

impl Debug for StimulusError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for driving the numerical backend
pub enum SimulationError {
    /// Backend has no morphology built
    MorphologyNotBuilt,
    /// Backend has morphology but biophysics have not been assigned
    BiophysicsNotAssigned,
    /// Integration requested before initialization
    NotInitialized,
    /// Initial voltage must be finite
    InvalidInitialVoltage(f64),
    /// Stimulus parameters changed before a stimulus was placed
    StimulusNotConfigured,
    /// Timestep must be finite and positive
    InvalidTimestep(f64),
    /// Stop time is earlier than the current simulation time
    StopTimeBeforeCurrentTime { t_stop: f64, t: f64 },
    /// Stop time needs more steps than a single integration allows
    TooManySteps { t_stop: f64, max: usize },
    /// Probe was never registered for recording
    ProbeNotRecorded(String),
    /// Voltage diverged during integration
    NonFiniteVoltage { section: String, t: f64 },
}

impl Display for SimulationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            SimulationError::MorphologyNotBuilt => write!(f, "Morphology has not been built"),
            SimulationError::BiophysicsNotAssigned => write!(f, "Biophysics have not been assigned"),
            SimulationError::NotInitialized => write!(f, "Simulation must be initialized before integrating"),
            SimulationError::InvalidInitialVoltage(v) => write!(f, "Initial voltage {} must be finite", v),
            SimulationError::StimulusNotConfigured => write!(f, "No stimulus has been configured"),
            SimulationError::InvalidTimestep(dt) => write!(f, "Timestep {} must be finite and positive", dt),
            SimulationError::StopTimeBeforeCurrentTime { t_stop, t } => write!(
                f, "Stop time {} ms is before current time {} ms", t_stop, t
            ),
            SimulationError::TooManySteps { t_stop, max } => write!(
                f, "Integrating to {} ms would take more than {} steps", t_stop, max
            ),
            SimulationError::ProbeNotRecorded(probe) => write!(f, "Probe {} is not being recorded", probe),
            SimulationError::NonFiniteVoltage { section, t } => write!(
                f, "Voltage in section '{}' became non-finite at {} ms", section, t
            ),
        }
    }
}

impl Debug for SimulationError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for reading run configuration files
pub enum ConfigError {
    /// File could not be read
    Io(String),
    /// File is not valid TOML
    Parse(String),
    /// Field has the wrong type
    InvalidField(String),
    /// Field is required but missing
    MissingField(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Cannot read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Cannot parse config: {}", msg),
            ConfigError::InvalidField(field) => write!(f, "Cannot parse '{}'", field),
            ConfigError::MissingField(field) => write!(f, "Missing required field '{}'", field),
        }
    }
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// A set of errors that may occur when using the library
pub enum CableNeuronError {
    /// Errors related to morphology
    MorphologyRelatedError(MorphologyError),
    /// Errors related to biophysics
    BiophysicsRelatedError(BiophysicsError),
    /// Errors related to stimulus configuration
    StimulusRelatedError(StimulusError),
    /// Errors related to running the simulation
    SimulationRelatedError(SimulationError),
    /// Errors related to configuration files
    ConfigRelatedError(ConfigError),
    /// Errors writing output
    OutputError(String),
}

impl Display for CableNeuronError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            CableNeuronError::MorphologyRelatedError(err) => write!(f, "{}", err),
            CableNeuronError::BiophysicsRelatedError(err) => write!(f, "{}", err),
            CableNeuronError::StimulusRelatedError(err) => write!(f, "{}", err),
            CableNeuronError::SimulationRelatedError(err) => write!(f, "{}", err),
            CableNeuronError::ConfigRelatedError(err) => write!(f, "{}", err),
            CableNeuronError::OutputError(msg) => write!(f, "Cannot write output: {}", msg),
        }
    }
}

impl Debug for CableNeuronError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl std::error::Error for CableNeuronError {}

impl From<MorphologyError> for CableNeuronError {
    fn from(err: MorphologyError) -> CableNeuronError {
        CableNeuronError::MorphologyRelatedError(err)
    }
}

impl From<BiophysicsError> for CableNeuronError {
    fn from(err: BiophysicsError) -> CableNeuronError {
        CableNeuronError::BiophysicsRelatedError(err)
    }
}

impl From<StimulusError> for CableNeuronError {
    fn from(err: StimulusError) -> CableNeuronError {
        CableNeuronError::StimulusRelatedError(err)
    }
}

impl From<SimulationError> for CableNeuronError {
    fn from(err: SimulationError) -> CableNeuronError {
        CableNeuronError::SimulationRelatedError(err)
    }
}

impl From<ConfigError> for CableNeuronError {
    fn from(err: ConfigError) -> CableNeuronError {
        CableNeuronError::ConfigRelatedError(err)
    }
}

impl From<std::io::Error> for CableNeuronError {
    fn from(err: std::io::Error) -> CableNeuronError {
        CableNeuronError::OutputError(err.to_string())
    }
}
