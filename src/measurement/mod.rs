//! Time analysis (measurement driver)
//!
//! For every requested sample size, in caller order and preceded by a size-0
//! warm-up that absorbs one-time engine initialization:
//!
//! 1. sample the dataset (with replacement when oversized)
//! 2. null `percent_to_nan` of the cells, if positive
//! 3. time one profile call
//! 4. time one self-merge (an empty-profile merge is recorded as unavailable)
//! 5. emit one record per column, plus an aggregate record for sizes > 0
//!
//! Randomness comes from one RNG seeded once per run, so identical inputs
//! produce identical samples and injections.
//!
//! ## Example
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use trueno_spacetime::dataset::generate_dataset;
//! use trueno_spacetime::engine::{ProfilerOptions, StructuredEngine};
//! use trueno_spacetime::measurement::TimeAnalysis;
//!
//! let data = generate_dataset(&mut StdRng::seed_from_u64(0), 10)?;
//! let engine = StructuredEngine::new(0);
//!
//! let records = TimeAnalysis::builder(&engine)
//!     .options(ProfilerOptions::default().with_data_labeler(false))
//!     .seed(0)
//!     .build()?
//!     .run(&[5], &data)?;
//!
//! assert_eq!(records.iter().filter(|r| r.is_aggregate()).count(), 1);
//! # Ok::<(), trueno_spacetime::Error>(())
//! ```

mod record;

pub use record::{RunSettings, SizeMeasurement, TimingRecord, AGGREGATE_ENTITY};

use crate::dataset::Dataset;
use crate::engine::{MergeError, ProfileReport, ProfilerOptions, ProfilingEngine};
use crate::nan::{inject_nans, validate_percent};
use crate::sampling::sample;
use crate::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

/// Size of the warm-up measurement prepended to every run
pub const WARM_UP_SIZE: usize = 0;

/// Sizes actually measured: the warm-up followed by the requested sizes
#[must_use]
pub fn measurement_schedule(sizes: &[usize]) -> Vec<usize> {
    std::iter::once(WARM_UP_SIZE).chain(sizes.iter().copied()).collect()
}

/// Configured time analysis over one engine
#[derive(Debug)]
pub struct TimeAnalysis<'a, E> {
    engine: &'a E,
    settings: RunSettings,
    seed: u64,
}

/// Builder for [`TimeAnalysis`]
#[derive(Debug)]
pub struct TimeAnalysisBuilder<'a, E> {
    engine: &'a E,
    options: ProfilerOptions,
    allow_subsampling: bool,
    percent_to_nan: f64,
    seed: u64,
}

impl<'a, E> TimeAnalysisBuilder<'a, E> {
    /// Create a builder with subsampling allowed, no nan injection, seed 0
    #[must_use]
    pub fn new(engine: &'a E) -> Self {
        Self {
            engine,
            options: ProfilerOptions::default(),
            allow_subsampling: true,
            percent_to_nan: 0.0,
            seed: 0,
        }
    }

    /// Engine options
    #[must_use]
    pub const fn options(mut self, options: ProfilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Let the engine choose its batching (`true`) or force one update per sample
    #[must_use]
    pub const fn allow_subsampling(mut self, allow: bool) -> Self {
        self.allow_subsampling = allow;
        self
    }

    /// Percentage of cells to null before profiling (`0..=100`)
    #[must_use]
    pub const fn percent_to_nan(mut self, percent: f64) -> Self {
        self.percent_to_nan = percent;
        self
    }

    /// Seed for sampling and nan injection
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the analysis
    ///
    /// # Errors
    /// Returns error if `percent_to_nan` is outside `0..=100`
    pub fn build(self) -> Result<TimeAnalysis<'a, E>> {
        validate_percent(self.percent_to_nan)?;
        Ok(TimeAnalysis {
            engine: self.engine,
            settings: RunSettings {
                percent_to_nan: self.percent_to_nan,
                allow_subsampling: self.allow_subsampling,
                options: self.options,
            },
            seed: self.seed,
        })
    }
}

impl<'a, E: ProfilingEngine> TimeAnalysis<'a, E> {
    /// Start building an analysis over `engine`
    #[must_use]
    pub fn builder(engine: &'a E) -> TimeAnalysisBuilder<'a, E> {
        TimeAnalysisBuilder::new(engine)
    }

    /// Measure every size in `sizes` (after the warm-up)
    ///
    /// # Errors
    /// Returns the first fatal error; no partial results are returned
    pub fn run(&self, sizes: &[usize], dataset: &Dataset) -> Result<Vec<TimingRecord>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut records = Vec::new();

        for size in measurement_schedule(sizes) {
            records.extend(self.measure_size(size, dataset, &mut rng)?);
        }

        tracing::info!(records = records.len(), "Results collected");
        Ok(records)
    }

    /// Measure a single sample size
    ///
    /// # Errors
    /// Returns error on sampling failure or any engine failure other than an
    /// empty-profile merge
    pub fn measure_size(
        &self,
        size: usize,
        dataset: &Dataset,
        rng: &mut StdRng,
    ) -> Result<Vec<TimingRecord>> {
        tracing::info!("Evaluating sample size: {size}");

        let mut data = sample(dataset, size, rng)?;
        if self.settings.percent_to_nan > 0.0 {
            data = inject_nans(&data, self.settings.percent_to_nan, rng)?;
        }

        let samples_per_update = if self.settings.allow_subsampling {
            None
        } else {
            Some(data.num_rows())
        };

        let start = Instant::now();
        let profile = self
            .engine
            .profile(&data, &self.settings.options, samples_per_update)?;
        let total_time = start.elapsed().as_secs_f64();

        let start = Instant::now();
        let merge = match self.engine.merge(&profile, &profile) {
            Ok(_) => Some(start.elapsed().as_secs_f64()),
            Err(MergeError::EmptyProfiles) => {
                tracing::warn!(size, "merge of empty profiles suppressed, merge time unavailable");
                None
            }
            Err(MergeError::Fatal(e)) => return Err(e),
        };

        let measurement = SizeMeasurement {
            sample_size: size,
            total_time,
            merge,
        };

        let mut records: Vec<TimingRecord> = profile
            .column_times()
            .into_iter()
            .map(|(name, tree)| TimingRecord::new(name, tree, &measurement, &self.settings))
            .collect();

        if size != WARM_UP_SIZE {
            records.push(TimingRecord::new(
                AGGREGATE_ENTITY,
                profile.times(),
                &measurement,
                &self.settings,
            ));
        }

        tracing::info!("COMPLETE sample size: {size}");
        tracing::info!("Profiled in {total_time} seconds");
        match merge {
            Some(seconds) => tracing::info!("Merge in {seconds} seconds"),
            None => tracing::info!("Merge unavailable"),
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::generate_dataset;
    use crate::engine::StructuredEngine;

    fn quiet_options() -> ProfilerOptions {
        ProfilerOptions::default()
            .with_multiprocess(false)
            .with_data_labeler(false)
    }

    #[test]
    fn test_schedule_prepends_warm_up() {
        assert_eq!(measurement_schedule(&[5, 3]), vec![0, 5, 3]);
        assert_eq!(measurement_schedule(&[]), vec![0]);
    }

    #[test]
    fn test_build_rejects_bad_percent() {
        let engine = StructuredEngine::new(0);
        assert!(TimeAnalysis::builder(&engine).percent_to_nan(101.0).build().is_err());
        assert!(TimeAnalysis::builder(&engine).percent_to_nan(-1.0).build().is_err());
        assert!(TimeAnalysis::builder(&engine).percent_to_nan(100.0).build().is_ok());
    }

    #[test]
    fn test_run_emits_column_and_aggregate_records() {
        let data = generate_dataset(&mut StdRng::seed_from_u64(0), 10).unwrap();
        let engine = StructuredEngine::new(0);
        let analysis = TimeAnalysis::builder(&engine)
            .options(quiet_options())
            .build()
            .unwrap();

        let records = analysis.run(&[5], &data).unwrap();
        let columns = data.num_columns();

        // warm-up columns + size-5 columns + one aggregate
        assert_eq!(records.len(), 2 * columns + 1);
        assert_eq!(records.iter().filter(|r| r.is_warm_up()).count(), columns);

        let aggregates: Vec<_> = records.iter().filter(|r| r.is_aggregate()).collect();
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].sample_size(), 5);
        assert!(aggregates[0].merge().is_some());

        assert!(records
            .iter()
            .filter(|r| r.is_warm_up())
            .all(|r| r.merge().is_none()));
    }

    #[test]
    fn test_run_preserves_caller_order() {
        let data = generate_dataset(&mut StdRng::seed_from_u64(0), 10).unwrap();
        let engine = StructuredEngine::new(0);
        let analysis = TimeAnalysis::builder(&engine)
            .options(quiet_options())
            .build()
            .unwrap();

        let records = analysis.run(&[8, 2], &data).unwrap();
        let sizes: Vec<usize> = records
            .iter()
            .filter(|r| r.is_aggregate())
            .map(TimingRecord::sample_size)
            .collect();
        assert_eq!(sizes, vec![8, 2]);
    }
}
