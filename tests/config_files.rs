#[cfg(test)]
mod tests {
    use std::path::Path;
    use cable_neuron::{
        config::RunConfig,
        error::{CableNeuronError, ConfigError},
    };


    #[test]
    pub fn test_sample_config_matches_defaults() -> Result<(), CableNeuronError> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/ball_and_stick.toml");
        let config = RunConfig::from_file(&path)?;
        let defaults = RunConfig::default();

        assert!(config.parallel);
        assert_eq!(config.cell, defaults.cell);
        assert_eq!(config.stimulus, defaults.stimulus);
        assert_eq!(config.run, defaults.run);
        assert_eq!(config.dt, defaults.dt);
        assert_eq!(config.sweeps, defaults.sweeps);

        Ok(())
    }

    #[test]
    pub fn test_missing_file() {
        assert!(matches!(
            RunConfig::from_file(Path::new("does/not/exist.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
