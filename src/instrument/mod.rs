//! Instrument drivers.

pub mod sg396;

pub use sg396::{Sg396, Sg396State};
