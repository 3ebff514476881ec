//! Test suites for the Hearth startup sequence.

mod support;
