//! Recording probes, owned voltage traces, and simple trace analysis

use std::{
    fmt::{Display, Formatter},
    io::Write,
    ops::Sub,
};
use crate::error::CableNeuronError;
use crate::morphology::SectionId;


/// A recording location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    /// Section being recorded
    pub section: SectionId,
    /// Normalized location along the section
    pub location: f64,
}

impl Probe {
    pub fn new(section: SectionId, location: f64) -> Self {
        Probe { section, location }
    }
}

impl Display for Probe {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "#{}({})", self.section.0, self.location)
    }
}

/// Voltage samples (mV) taken once per timestep, owned by the caller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trace {
    pub samples: Vec<f64>,
}

impl Trace {
    pub fn new(samples: Vec<f64>) -> Self {
        Trace { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index and value of the largest sample
    pub fn peak(&self) -> Option<(usize, f64)> {
        self.samples.iter()
            .copied()
            .enumerate()
            .fold(None, |best, (n, v)| match best {
                Some((_, best_v)) if best_v >= v => best,
                _ => Some((n, v)),
            })
    }

    /// Largest sample among those whose time lies within `[start, end]`
    pub fn peak_between(&self, time: &[f64], start: f64, end: f64) -> Option<(usize, f64)> {
        self.samples.iter()
            .copied()
            .zip(time.iter().copied())
            .enumerate()
            .filter(|(_, (_, t))| *t >= start && *t <= end)
            .fold(None, |best, (n, (v, _))| match best {
                Some((_, best_v)) if best_v >= v => best,
                _ => Some((n, v)),
            })
    }

    /// Sample closest to time `t`
    pub fn value_at(&self, time: &[f64], t: f64) -> Option<f64> {
        time.iter()
            .enumerate()
            .take(self.samples.len())
            .min_by(|(_, a), (_, b)| (*a - t).abs().total_cmp(&(*b - t).abs()))
            .map(|(n, _)| self.samples[n])
    }

    /// Largest absolute difference between corresponding samples, compared
    /// over the shorter of the two traces
    pub fn max_abs_difference(&self, other: &Trace) -> f64 {
        self.samples.iter()
            .zip(other.samples.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0., f64::max)
    }

    /// Number of upward crossings of `threshold`
    pub fn count_spikes(&self, threshold: f64) -> usize {
        self.samples.windows(2)
            .filter(|pair| pair[0] < threshold && pair[1] >= threshold)
            .count()
    }

    /// See [`find_peaks`]
    pub fn find_peaks(&self, tolerance: f64) -> Vec<usize> {
        find_peaks(&self.samples, tolerance)
    }
}

fn diff<T: Sub<Output = T> + Copy>(x: &[T]) -> Vec<T> {
    (1..x.len()).map(|i| x[i] - x[i-1])
        .collect()
}

/// Returns indices of where voltages have peaked given a tolerance
/// on how flat the trace must be at the peak
pub fn find_peaks(voltages: &[f64], tolerance: f64) -> Vec<usize> {
    let first_diff = diff(voltages);
    let second_diff = diff(&first_diff);

    // flat points that are concave down, snapped to the higher neighbor
    let local_maxima: Vec<usize> = first_diff.iter()
        .enumerate()
        .filter(|(n, i)| i.abs() <= tolerance && *n < second_diff.len() && second_diff[*n] < 0.)
        .map(|(n, _)| if voltages[n + 1] > voltages[n] { n + 1 } else { n })
        .collect();

    let mut peak_spans: Vec<Vec<usize>> = Vec::new();
    for i in local_maxima {
        match peak_spans.last_mut() {
            Some(span) if span.last().map_or(false, |last| i <= last + 1) => span.push(i),
            _ => peak_spans.push(vec![i]),
        }
    }

    peak_spans.iter()
        .filter_map(|span| {
            span.iter()
                .copied()
                .max_by(|a, b| voltages[*a].total_cmp(&voltages[*b]))
        })
        .collect()
}

/// A named trace in a [`Recording`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTrace {
    /// Human readable probe name, such as `soma(0.5)`
    pub label: String,
    pub probe: Probe,
    pub trace: Trace,
}

/// Result of one run, the time vector and one trace per probe
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recording {
    /// Sample times (ms)
    pub time: Vec<f64>,
    pub traces: Vec<RecordedTrace>,
}

impl Recording {
    /// Trace recorded at a probe
    pub fn trace(&self, probe: &Probe) -> Option<&Trace> {
        self.traces.iter()
            .find(|i| i.probe == *probe)
            .map(|i| &i.trace)
    }

    /// Trace recorded under a label
    pub fn trace_by_label(&self, label: &str) -> Option<&Trace> {
        self.traces.iter()
            .find(|i| i.label == label)
            .map(|i| &i.trace)
    }

    /// Writes the recording as comma separated values with a header row,
    /// one row per timestep
    pub fn write_csv<W: Write>(&self, writer: &mut W) -> Result<(), CableNeuronError> {
        let header: Vec<&str> = std::iter::once("t")
            .chain(self.traces.iter().map(|i| i.label.as_str()))
            .collect();
        writeln!(writer, "{}", header.join(","))?;

        for (n, t) in self.time.iter().enumerate() {
            write!(writer, "{}", t)?;
            for recorded in &self.traces {
                match recorded.trace.samples.get(n) {
                    Some(v) => write!(writer, ",{}", v)?,
                    None => write!(writer, ",")?,
                }
            }
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(())
    }
}
