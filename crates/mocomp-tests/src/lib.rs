//! Integration test crate for mocomp.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple mocomp crates to verify they work together.

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod motion;

#[cfg(test)]
mod gop;

#[cfg(test)]
mod pipeline;
