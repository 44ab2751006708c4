//! Test suites for the bootstrap sequence.

pub(crate) mod support;
