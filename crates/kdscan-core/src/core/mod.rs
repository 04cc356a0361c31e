//! # Core Module
//!
//! The stateless foundation of the library: data models, numerical solvers,
//! file formats and the curve analysis used by the sweep engine.
//!
//! ## Overview
//!
//! Nothing in this module owns long-lived state or performs orchestration.
//! Every operation is a function of its inputs, which keeps the numerics
//! testable in isolation and safe to call from many worker threads at once.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Binding models, species states, scattering
//!   curves and chi-squared records
//! - **Equilibrium** ([`equilibrium`]) - Mass-action solvers for each binding
//!   model and the fraction-profile generator
//! - **Kd Grid** ([`grid`]) - Log-spaced, fixed-precision trial Kd values
//! - **File I/O** ([`io`]) - Theoretical (`.int`), experimental (`.dat`) and
//!   fit (`.fit`) curve files plus CSV exports
//! - **Analysis** ([`analysis`]) - L-curve estimation of the optimal Kd
//!
//! ## Scientific Foundation
//!
//! - **Linear mixing** of per-species scattering profiles weighted by the
//!   equilibrium fractions
//! - **Mass-action equilibria** solved with a damped Newton iteration
//! - **Elbow detection** by maximum curvature in log-log space

pub mod analysis;
pub mod equilibrium;
pub mod grid;
pub mod io;
pub mod models;
