//! Cylindrical sections, their discretization into segments, and the
//! parent/child topology connecting them into a tree

use std::f64::consts::PI;
use crate::error::MorphologyError;


/// Index of a section within a [`Morphology`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(pub usize);

/// End of a section that attaches to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionEnd {
    /// The `x = 0` end
    Zero,
    /// The `x = 1` end
    One,
}

impl SectionEnd {
    /// Normalized location of the end
    pub fn location(&self) -> f64 {
        match self {
            SectionEnd::Zero => 0.,
            SectionEnd::One => 1.,
        }
    }
}

/// Attachment of a child section to a point on its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Parent section
    pub parent: SectionId,
    /// Normalized location on the parent the child attaches to
    pub parent_location: f64,
    /// End of the child that touches the parent
    pub child_end: SectionEnd,
}

/// A cylindrical piece of neuron morphology
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Name used for lookup and output
    pub name: String,
    /// Length (µm)
    pub length: f64,
    /// Diameter (µm)
    pub diameter: f64,
    /// Number of segments the section is discretized into
    pub nseg: usize,
    /// Connection to the parent section, `None` for a root
    pub parent: Option<Connection>,
}

impl Section {
    /// Length of a single segment (µm)
    pub fn segment_length(&self) -> f64 {
        self.length / self.nseg as f64
    }

    /// Lateral membrane area of a single segment (cm²)
    pub fn segment_area(&self) -> f64 {
        // µm² to cm²
        PI * self.diameter * self.segment_length() * 1e-8
    }

    /// Cross sectional area (µm²)
    pub fn cross_sectional_area(&self) -> f64 {
        PI * (self.diameter / 2.).powi(2)
    }

    /// Axial resistance (MΩ) along `distance` µm of the section given
    /// a specific axial resistivity `ra` in Ω·cm
    pub fn axial_resistance(&self, ra: f64, distance: f64) -> f64 {
        // Ω·cm · µm / µm² = 1e4 Ω = 1e-2 MΩ
        ra * distance / self.cross_sectional_area() * 1e-2
    }

    /// Index of the segment containing the normalized location `x`, the
    /// ends map to the first and last segment
    pub fn segment_index(&self, x: f64) -> usize {
        ((x * self.nseg as f64).floor() as usize).min(self.nseg - 1)
    }

    /// Normalized location of the center of each segment
    pub fn segment_centers(&self) -> Vec<f64> {
        (0..self.nseg)
            .map(|i| (i as f64 + 0.5) / self.nseg as f64)
            .collect()
    }
}

fn check_location(x: f64) -> Result<(), MorphologyError> {
    if !(0. ..=1.).contains(&x) {
        return Err(MorphologyError::LocationOutOfRange(x));
    }

    Ok(())
}

/// A tree of connected sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Morphology {
    sections: Vec<Section>,
}

impl Morphology {
    /// Creates an empty morphology
    pub fn new() -> Self {
        Morphology::default()
    }

    /// Adds an unconnected section with a single segment
    pub fn add_section(&mut self, name: &str, length: f64, diameter: f64) -> Result<SectionId, MorphologyError> {
        if self.sections.iter().any(|section| section.name == name) {
            return Err(MorphologyError::DuplicateSection(String::from(name)));
        }
        if !(length.is_finite() && length > 0. && diameter.is_finite() && diameter > 0.) {
            return Err(MorphologyError::InvalidGeometry(String::from(name)));
        }

        self.sections.push(Section {
            name: String::from(name),
            length,
            diameter,
            nseg: 1,
            parent: None,
        });

        Ok(SectionId(self.sections.len() - 1))
    }

    /// Attaches `child_end` of `child` to `parent_location` on `parent`
    pub fn connect(
        &mut self,
        child: SectionId,
        child_end: SectionEnd,
        parent: SectionId,
        parent_location: f64,
    ) -> Result<(), MorphologyError> {
        check_location(parent_location)?;
        self.section(parent)?;
        let child_name = self.section(child)?.name.clone();

        if self.section(child)?.parent.is_some() {
            return Err(MorphologyError::AlreadyConnected(child_name));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(MorphologyError::CyclicConnection(child_name));
        }

        self.sections[child.0].parent = Some(Connection { parent, parent_location, child_end });

        Ok(())
    }

    // whether `ancestor` is `id` or lies on the path from `id` to its root
    fn is_ancestor_or_self(&self, ancestor: SectionId, id: SectionId) -> bool {
        let mut current = Some(id);
        while let Some(section_id) = current {
            if section_id == ancestor {
                return true;
            }
            current = self.sections[section_id.0].parent.map(|connection| connection.parent);
        }

        false
    }

    /// Sets the number of segments of a section
    pub fn set_nseg(&mut self, id: SectionId, nseg: usize) -> Result<(), MorphologyError> {
        let section = self.sections.get_mut(id.0)
            .ok_or_else(|| MorphologyError::SectionNotFound(format!("#{}", id.0)))?;
        if nseg == 0 {
            return Err(MorphologyError::InvalidSegmentCount(section.name.clone()));
        }
        section.nseg = nseg;

        Ok(())
    }

    /// Returns the section with the given id
    pub fn section(&self, id: SectionId) -> Result<&Section, MorphologyError> {
        self.sections.get(id.0)
            .ok_or_else(|| MorphologyError::SectionNotFound(format!("#{}", id.0)))
    }

    /// Looks up a section by name
    pub fn find(&self, name: &str) -> Result<SectionId, MorphologyError> {
        self.sections.iter()
            .position(|section| section.name == name)
            .map(SectionId)
            .ok_or_else(|| MorphologyError::SectionNotFound(String::from(name)))
    }

    /// All sections in insertion order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Iterates over ids and sections in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections.iter()
            .enumerate()
            .map(|(n, section)| (SectionId(n), section))
    }

    /// Children of a section in insertion order
    pub fn children(&self, id: SectionId) -> Vec<SectionId> {
        self.iter()
            .filter(|(_, section)| section.parent.map(|connection| connection.parent) == Some(id))
            .map(|(child, _)| child)
            .collect()
    }

    /// Section ids ordered so every parent precedes its children
    pub fn topological_order(&self) -> Vec<SectionId> {
        let mut order: Vec<SectionId> = self.iter()
            .filter(|(_, section)| section.parent.is_none())
            .map(|(id, _)| id)
            .collect();

        let mut index = 0;
        while index < order.len() {
            let children = self.children(order[index]);
            order.extend(children);
            index += 1;
        }

        order
    }

    /// Total number of segments across every section
    pub fn total_segments(&self) -> usize {
        self.sections.iter().map(|section| section.nseg).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_index_covers_ends() {
        let section = Section {
            name: String::from("dend"),
            length: 200.,
            diameter: 1.,
            nseg: 5,
            parent: None,
        };

        assert_eq!(section.segment_index(0.), 0);
        assert_eq!(section.segment_index(0.5), 2);
        assert_eq!(section.segment_index(1.), 4);
        assert_eq!(section.segment_centers(), vec![0.1, 0.3, 0.5, 0.7, 0.9]);
    }

    #[test]
    fn test_axial_resistance_units() {
        let section = Section {
            name: String::from("dend"),
            length: 200.,
            diameter: 1.,
            nseg: 1,
            parent: None,
        };

        // 100 Ω·cm over 200 µm of a 1 µm cable is roughly 254.6 MΩ
        let resistance = section.axial_resistance(100., 200.);
        assert!((resistance - 254.648).abs() < 1e-2);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut morphology = Morphology::new();
        let a = morphology.add_section("a", 10., 1.).unwrap();
        let b = morphology.add_section("b", 10., 1.).unwrap();
        morphology.connect(b, SectionEnd::Zero, a, 1.).unwrap();

        assert!(matches!(
            morphology.connect(a, SectionEnd::Zero, b, 1.),
            Err(MorphologyError::CyclicConnection(_))
        ));
        assert!(matches!(
            morphology.connect(a, SectionEnd::Zero, a, 0.5),
            Err(MorphologyError::CyclicConnection(_))
        ));
    }

    #[test]
    fn test_topological_order_puts_parents_first() {
        let mut morphology = Morphology::new();
        let dend = morphology.add_section("dend", 200., 1.).unwrap();
        let soma = morphology.add_section("soma", 12.6157, 12.6157).unwrap();
        morphology.connect(dend, SectionEnd::Zero, soma, 1.).unwrap();

        assert_eq!(morphology.topological_order(), vec![soma, dend]);
    }
}
