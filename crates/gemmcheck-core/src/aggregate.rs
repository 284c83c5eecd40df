//! Reducing samples into report statistics.

use std::ops::ControlFlow;

use crate::error::SampleError;
use crate::report::RunStatus;
use crate::sampler::Sample;

/// Round to two decimals, the precision throughput is reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Best benchmark result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub size: usize,
    /// Rounded to two decimals.
    pub tflops: f64,
}

/// The sample with the highest reported (rounded) throughput.
///
/// Ties go to the first sample encountered, i.e. the smallest size when
/// samples are in ascending size order. `None` for an empty input.
pub fn peak<'a, I>(samples: I) -> Option<Peak>
where
    I: IntoIterator<Item = &'a Sample>,
{
    samples.into_iter().fold(None, |best: Option<Peak>, sample| {
        let candidate = Peak {
            size: sample.dimension,
            tflops: round2(sample.tflops),
        };
        match best {
            Some(current) if current.tflops >= candidate.tflops => Some(current),
            _ => Some(candidate),
        }
    })
}

/// Mean, minimum and maximum throughput, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThroughputSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ThroughputSummary {
    /// All zero when `samples` is empty.
    pub fn from_samples(samples: &[Sample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let (sum, min, max) = samples.iter().map(|s| s.tflops).fold(
            (0.0, f64::INFINITY, f64::NEG_INFINITY),
            |(sum, min, max), t| (sum + t, min.min(t), max.max(t)),
        );
        Self {
            mean: round2(sum / samples.len() as f64),
            min: round2(min),
            max: round2(max),
        }
    }
}

/// Error accounting for the stress loop.
///
/// Samples and errors are accumulated in order. Once the error count
/// exceeds `threshold`, [`ErrorBudget::record`] breaks and the abort message
/// is kept; isolated failures below the threshold are tolerated.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBudget {
    threshold: usize,
    samples: Vec<Sample>,
    errors: usize,
    abort_message: Option<String>,
}

impl ErrorBudget {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            samples: Vec::new(),
            errors: 0,
            abort_message: None,
        }
    }

    /// Record one iteration outcome; `Break` means stop sampling.
    pub fn record(&mut self, outcome: Result<Sample, SampleError>) -> ControlFlow<()> {
        match outcome {
            Ok(sample) => {
                self.samples.push(sample);
                ControlFlow::Continue(())
            }
            Err(e) => {
                self.errors += 1;
                if self.errors > self.threshold {
                    self.abort_message = Some(format!("Too many errors: {e}"));
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iterations(&self) -> usize {
        self.samples.len()
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn abort_message(&self) -> Option<&str> {
        self.abort_message.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.abort_message.is_some()
    }

    pub fn summary(&self) -> ThroughputSummary {
        ThroughputSummary::from_samples(&self.samples)
    }

    /// `Success` with no errors, `CompletedWithErrors` otherwise.
    pub fn status(&self) -> RunStatus {
        if self.errors == 0 { RunStatus::Success } else { RunStatus::CompletedWithErrors }
    }
}

/// Fold a sequence of outcomes through an [`ErrorBudget`], stopping early
/// once the budget is exhausted. Outcomes after the stop are not consumed.
pub fn fold_outcomes<I>(outcomes: I, threshold: usize) -> ErrorBudget
where
    I: IntoIterator<Item = Result<Sample, SampleError>>,
{
    let mut budget = ErrorBudget::new(threshold);
    for outcome in outcomes {
        if budget.record(outcome).is_break() {
            break;
        }
    }
    budget
}
