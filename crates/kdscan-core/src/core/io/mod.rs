//! Reading and writing the file formats exchanged with the fit engine and the user.
//!
//! Whitespace-separated curve files share the [`traits::CurveFile`] interface:
//! two-column theoretical profiles ([`int`]), three-column experimental data
//! ([`dat`]) and the fit engine's four-column output ([`fit`]). Tabular
//! results are exported as CSV by [`table`].

pub mod dat;
pub mod fit;
pub mod int;
pub mod table;
pub mod traits;
