//! unitok CLI library
//!
//! Shared plumbing for the `utokenize` and `detokenize` binaries:
//! argument definitions, input/output wiring, and the processing loops.

pub mod args;
pub mod io;
pub mod run;
