//! Core building blocks: the combination table, the row-driven combine loop,
//! and run parameters. These are consumed by the high-level `api` module.
pub mod combine;
pub mod params;
