//! Per section electrical parameters and inserted density mechanisms

use std::collections::BTreeMap;
use crate::error::{BiophysicsError, CableNeuronError};
use crate::mechanisms::DensityMechanism;
use crate::morphology::{Morphology, SectionId};


/// Electrical properties of one section
#[derive(Debug, Clone)]
pub struct SectionBiophysics {
    /// Axial resistivity (Ω·cm)
    pub ra: f64,
    /// Specific membrane capacitance (µF/cm²)
    pub cm: f64,
    /// Inserted density mechanisms
    pub mechanisms: Vec<Box<dyn DensityMechanism>>,
}

impl Default for SectionBiophysics {
    fn default() -> Self {
        SectionBiophysics {
            ra: 35.4,
            cm: 1.,
            mechanisms: vec![],
        }
    }
}

impl SectionBiophysics {
    /// Creates section biophysics without any mechanisms
    pub fn new(ra: f64, cm: f64) -> Self {
        SectionBiophysics { ra, cm, mechanisms: vec![] }
    }

    /// Inserts a mechanism, replacing a previously inserted
    /// mechanism with the same name
    pub fn insert<M: DensityMechanism + 'static>(&mut self, mechanism: M) {
        self.insert_boxed(Box::new(mechanism));
    }

    /// Inserts an already boxed mechanism
    pub fn insert_boxed(&mut self, mechanism: Box<dyn DensityMechanism>) {
        match self.mechanisms.iter_mut().find(|i| i.name() == mechanism.name()) {
            Some(existing) => *existing = mechanism,
            None => self.mechanisms.push(mechanism),
        }
    }

    /// Removes a mechanism by name, returns whether it was present
    pub fn uninsert(&mut self, name: &str) -> bool {
        let before = self.mechanisms.len();
        self.mechanisms.retain(|i| i.name() != name);

        before != self.mechanisms.len()
    }

    /// Names of inserted mechanisms in insertion order
    pub fn mechanism_names(&self) -> Vec<&'static str> {
        self.mechanisms.iter()
            .map(|i| i.name())
            .collect()
    }

    /// Checks resistivity, capacitance and every mechanism
    pub fn validate(&self, section_name: &str) -> Result<(), BiophysicsError> {
        if !(self.ra.is_finite() && self.ra > 0.) {
            return Err(BiophysicsError::InvalidAxialResistance(String::from(section_name)));
        }
        if !(self.cm.is_finite() && self.cm > 0.) {
            return Err(BiophysicsError::InvalidCapacitance(String::from(section_name)));
        }

        self.mechanisms.iter()
            .try_for_each(|i| i.validate())
    }
}

/// Biophysics for every section of a morphology
#[derive(Debug, Clone, Default)]
pub struct Biophysics {
    sections: BTreeMap<SectionId, SectionBiophysics>,
}

impl Biophysics {
    /// Creates empty biophysics
    pub fn new() -> Self {
        Biophysics::default()
    }

    /// Assigns biophysics to a section, replacing any previous assignment
    pub fn set(&mut self, id: SectionId, section_biophysics: SectionBiophysics) {
        self.sections.insert(id, section_biophysics);
    }

    /// Biophysics of a section if assigned
    pub fn get(&self, id: SectionId) -> Option<&SectionBiophysics> {
        self.sections.get(&id)
    }

    /// Mutable biophysics of a section if assigned
    pub fn get_mut(&mut self, id: SectionId) -> Option<&mut SectionBiophysics> {
        self.sections.get_mut(&id)
    }

    /// Names of mechanisms inserted into a section
    pub fn mechanism_names(&self, id: SectionId) -> Vec<&'static str> {
        self.sections.get(&id)
            .map(|i| i.mechanism_names())
            .unwrap_or_default()
    }

    /// Checks that every section of `morphology` has valid biophysics
    pub fn validate(&self, morphology: &Morphology) -> Result<(), CableNeuronError> {
        for (id, section) in morphology.iter() {
            let section_biophysics = self.sections.get(&id)
                .ok_or_else(|| BiophysicsError::BiophysicsNotAssigned(section.name.clone()))?;
            section_biophysics.validate(&section.name)?;
        }

        Ok(())
    }
}
