//! # Workflows Module
//!
//! End-to-end entry points that tie the engine and the core numerics together.
//!
//! ## Overview
//!
//! The [`sweep`] workflow takes experimental datasets at one or more
//! concentrations and the theoretical profiles of every species, sweeps the
//! Kd grid at each concentration, averages the chi-squared curves, estimates
//! the optimal Kd from the averaged curve's L-curve, and evaluates the species
//! fractions at that Kd.
//!
//! ## Key Capabilities
//!
//! - **Species profile averaging** over several structures of one state
//! - **Per-concentration and averaged analyses** with confidence flags
//! - **Best-fit retrieval** with normalized residuals for each concentration

pub mod sweep;
