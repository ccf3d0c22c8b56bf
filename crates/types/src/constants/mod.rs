//! Engine-wide constants

pub mod limits;
