//! Stateless data models shared by the solver, the sweep engine and the analysis.
//!
//! - [`binding`] - the equilibrium models and their species layout
//! - [`species`] - the result of one equilibrium solve
//! - [`curve`] - scattering profiles and their linear combination
//! - [`chi2`] - per-Kd fit records and concentration-averaged curves

pub mod binding;
pub mod chi2;
pub mod curve;
pub mod species;
