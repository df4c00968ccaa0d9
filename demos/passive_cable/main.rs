use std::{
    fs::File,
    io::{BufWriter, Write},
};
extern crate cable_neuron;
use cable_neuron::{
    biophysics::{Biophysics, SectionBiophysics},
    engine::{RunParameters, Simulation},
    mechanisms::Passive,
    morphology::{Morphology, SectionEnd},
    recording::Probe,
    stimulus::CurrentClamp,
};


// Injects current into one end of a branched passive cable and writes the
// voltage at the injection site, the branch point and both branch tips
// to a .csv file at the working directory
fn main() {
    let mut morphology = Morphology::new();
    let trunk = morphology.add_section("trunk", 300., 2.).expect("Could not add trunk");
    let left = morphology.add_section("left", 200., 1.).expect("Could not add branch");
    let right = morphology.add_section("right", 200., 1.).expect("Could not add branch");
    morphology.connect(left, SectionEnd::Zero, trunk, 1.).expect("Could not connect branch");
    morphology.connect(right, SectionEnd::Zero, trunk, 1.).expect("Could not connect branch");
    for (id, nseg) in [(trunk, 31), (left, 21), (right, 21)] {
        morphology.set_nseg(id, nseg).expect("Could not set segments");
    }

    let mut biophysics = Biophysics::new();
    for (id, _) in morphology.iter() {
        let mut section = SectionBiophysics::new(150., 1.);
        section.insert(Passive { g: 0.0002, e: -70., ..Passive::default() });
        biophysics.set(id, section);
    }

    let mut simulation = Simulation::with_cable_solver(morphology, biophysics)
        .expect("Could not build simulation");
    simulation.set_stimulus(CurrentClamp { delay: 2., dur: 20., amp: 0.05, ..CurrentClamp::new(trunk, 0.) })
        .expect("Could not place stimulus");

    let probes = [
        Probe::new(trunk, 0.),
        Probe::new(trunk, 1.),
        Probe::new(left, 1.),
        Probe::new(right, 1.),
    ];
    for probe in probes {
        simulation.add_probe(probe).expect("Could not add probe");
    }

    let recording = simulation.run(RunParameters { v_init: -70., t_stop: 50. })
        .expect("Could not run simulation");

    let mut file = BufWriter::new(File::create("passive_cable.csv")
        .expect("Could not create file"));
    recording.write_csv(&mut file).expect("Could not write to file");
    file.flush().expect("Could not write to file");
}
