//! Units of work executed by the sweep.
//!
//! A [`trial`] evaluates one Kd at one concentration: it solves the
//! equilibrium, writes the mixed theoretical curve and asks the fit engine
//! for a chi-squared value. A [`kd_sweep`] runs every trial of the Kd grid
//! for one concentration and aggregates them into a chi-squared curve.

pub mod kd_sweep;
pub mod trial;
