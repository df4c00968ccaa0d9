#![feature(test)]
extern crate test;


mod tests {
    use test::Bencher;
    extern crate cable_neuron;
    use cable_neuron::{
        cell::{BallAndStick, CellParameters, StimulusParameters},
        engine::RunParameters,
        solver::CableSolver,
        sweep::{run_sweep, run_sweep_parallel, tutorial_amplitudes, SweepPlan},
    };

    fn bench_run(b: &mut Bencher, dend_nseg: usize) {
        let params = CellParameters { dend_nseg, ..CellParameters::default() };
        let cell = BallAndStick::from_parameters(0, &params).expect("Could not build cell");
        let stimulus = StimulusParameters::default().on_dendrite(&cell);
        let mut simulation = cell.into_simulation(CableSolver::default(), stimulus)
            .expect("Could not build simulation");

        b.iter(|| {
            simulation.run(RunParameters::default()).expect("Could not run simulation")
        })
    }

    #[bench]
    fn bench_ball_and_stick_nseg_1(b: &mut Bencher) {
        bench_run(b, 1);
    }

    #[bench]
    fn bench_ball_and_stick_nseg_101(b: &mut Bencher) {
        bench_run(b, 101);
    }

    #[bench]
    fn bench_sweep_sequential(b: &mut Bencher) {
        let cell = BallAndStick::new(0).expect("Could not build cell");
        let stimulus = StimulusParameters::default().on_dendrite(&cell);
        let simulation = cell.into_simulation(CableSolver::default(), stimulus)
            .expect("Could not build simulation");
        let plan = SweepPlan::amplitudes(tutorial_amplitudes());

        b.iter(|| {
            run_sweep(&simulation, &plan, RunParameters::default()).expect("Could not run sweep")
        })
    }

    #[bench]
    fn bench_sweep_parallel(b: &mut Bencher) {
        let cell = BallAndStick::new(0).expect("Could not build cell");
        let stimulus = StimulusParameters::default().on_dendrite(&cell);
        let simulation = cell.into_simulation(CableSolver::default(), stimulus)
            .expect("Could not build simulation");
        let plan = SweepPlan::amplitudes(tutorial_amplitudes());

        b.iter(|| {
            run_sweep_parallel(&simulation, &plan, RunParameters::default()).expect("Could not run sweep")
        })
    }
}
