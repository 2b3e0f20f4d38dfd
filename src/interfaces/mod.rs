//! Edges of the crate: CSV catalog input and CSV report output.

pub mod csv;
