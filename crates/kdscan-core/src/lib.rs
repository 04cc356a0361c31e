//! # kdscan Core Library
//!
//! Estimates dissociation constants (Kd) of self-associating or ligand-binding
//! systems from small-angle X-ray scattering data.
//!
//! For every trial Kd on a log-spaced grid, the binding equilibrium is solved
//! for the species fractions, the species' theoretical scattering profiles are
//! mixed accordingly, and an external fit engine scores the mixture against
//! the experimental profile. The resulting chi-squared-vs-Kd curve is analysed
//! for its point of maximum curvature, which gives the estimated Kd and its
//! uncertainty.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`BindingModel`,
//!   `ScatteringCurve`, `ChiSquaredCurve`), the equilibrium solvers, the Kd
//!   grid, file formats and the L-curve numerics.
//!
//! - **[`engine`]: The Logic Core.** The stateful sweep machinery: configuration,
//!   error taxonomy, progress reporting, cancellation, the workspace and fit-engine
//!   abstractions, and the per-Kd and per-concentration tasks.
//!
//! - **[`workflows`]: The Public API.** Complete procedures, such as a
//!   multi-concentration sweep followed by averaging and Kd estimation.

pub mod core;
pub mod engine;
pub mod workflows;
