//! Flattens hierarchical situation overrides into ordered multi-valued maps.
//!
//! Layers, from the inside out:
//! - [`domain`]: situation trees, the ordered multi-map, the merge engine and
//!   the configuration document codec. Pure, no I/O.
//! - [`application`]: experiment definition service and per-experiment logs.
//! - [`infrastructure`]: filesystem boundary and service wiring.
//! - [`cli`]: command line surface.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
