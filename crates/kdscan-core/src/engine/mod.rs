//! # Engine Module
//!
//! The stateful machinery that turns a Kd grid into chi-squared curves.
//!
//! ## Overview
//!
//! A sweep evaluates every Kd of a log-spaced grid at each experimental
//! concentration. Each trial solves the binding equilibrium, mixes the
//! species' scattering curves by the resulting fractions, writes the mixture
//! to the run workspace and hands it to an external fit engine for scoring.
//! Trials are independent and run concurrently; their results are gathered
//! into one chi-squared curve per concentration.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Sweep parameters and their builder
//! - **Error Handling** ([`error`]) - The sweep's error taxonomy
//! - **Progress Monitoring** ([`progress`]) - Phase and task events for front ends
//! - **Cancellation** ([`cancel`]) - Cooperative stop between trials
//! - **Artifacts** ([`workspace`]) - Where theoretical curves, fits and logs live
//! - **External Tools** ([`process`], [`fitter`]) - Process execution and the fit-engine capability
//! - **Caching** ([`cache`]) - Memoized L-curve analyses
//!
//! ## Key Capabilities
//!
//! - **Parallel trials** on a bounded worker pool, aggregated in grid order
//! - **Local recovery** from unphysical equilibria and failed fits
//! - **Up-front validation** of inputs and tool availability
//! - **Injectable fit engines and workspaces** for testing without external tools

pub mod cache;
pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod fitter;
pub mod process;
pub mod progress;
pub(crate) mod tasks;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;
