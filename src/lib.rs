//! # Trueno-Spacetime: Space/Time Analysis for Structured Profilers
//!
//! **Version**: 0.1.0
//!
//! Measures how long a structured profiling engine takes to profile and merge
//! datasets of increasing size, and how much heap it allocates doing so.
//!
//! ## Pipeline
//!
//! ```text
//! Dataset ──sample──> Sample ──inject_nans──> Profiled input
//!                                                 │
//!                      TimeAnalysis::run ─────────┤ profile + self-merge, timed
//!                                                 ▼
//!                      Vec<TimingRecord> ──aggregate──> JSON + CSV (TimingTable)
//!
//! trace_to_file(path, op) ── dhat heap artifact for one profile / one merge
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use rand::{rngs::StdRng, SeedableRng};
//! use trueno_spacetime::dataset::generate_dataset;
//! use trueno_spacetime::engine::{ProfilerOptions, StructuredEngine};
//! use trueno_spacetime::measurement::TimeAnalysis;
//! use trueno_spacetime::report::aggregate;
//!
//! let data = generate_dataset(&mut StdRng::seed_from_u64(0), 100)?;
//! let engine = StructuredEngine::new(0);
//!
//! let records = TimeAnalysis::builder(&engine)
//!     .options(ProfilerOptions::default().with_data_labeler(false))
//!     .build()?
//!     .run(&[10, 50], &data)?;
//!
//! let (_records, table) = aggregate(records)?;
//! assert!(!table.is_empty());
//! # Ok::<(), trueno_spacetime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod measurement;
pub mod nan;
pub mod report;
pub mod sampling;
pub mod trace;

pub use error::{Error, Result};
