//! Test harness for the geometry pipeline.
//!
//! Builds input files in every supported format, runs them end to end and
//! checks the output with oracles that report instead of panicking, so a
//! scenario can collect every failure in one pass.
//!
//! # Key Components
//!
//! - [`fixtures`]: STL, STEP, IGES and OBJ inputs built in memory
//! - [`oracle`]: Verification functions returning pass/fail verdicts
//! - [`assertions`]: `Result`-returning assertions over pipeline results
//! - [`helpers`]: Error type and mesh math

pub mod assertions;
pub mod fixtures;
pub mod helpers;
pub mod oracle;

pub use helpers::HarnessError;
pub use oracle::OracleVerdict;
