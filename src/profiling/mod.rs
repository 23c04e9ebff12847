//! Execution profiling.
//!
//! [`tracker::PerformanceTracker`] accumulates per-system timing recorded by
//! the scheduler. It is a side channel for external diagnostics: consumers pull
//! a [`tracker::PerformanceSnapshot`], and nothing it holds feeds back into
//! scheduling decisions.
//!
//! Each tick runs in a `tracing` span and each stage emits a trace event; install any
//! subscriber (for example `tracing-subscriber` with a span-timing layer) to
//! observe them.

pub mod tracker;
