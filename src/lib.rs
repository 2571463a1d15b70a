//! Core of a multi-device NETCONF controller: device handle registry and
//! lifecycle, dynamic schema-driven grammar synthesis, and schema-mount
//! resolution. See `DESIGN.md` for the grounding of each module.
//!
//! Out of scope (external collaborators specified at the boundary, see
//! [`backend`], [`transport`], and [`grammar::runtime`]): the wire
//! transport, the generic XML/XPath engine, the schema-list parser, the
//! command-grammar tree engine, and process bootstrap/config/logging.

pub mod backend;
pub mod cli;
pub mod config;
pub mod controller;
pub mod device;
pub mod domain;
pub mod error;
pub mod grammar;
pub mod mount;
pub mod spec;
pub mod transport;

pub use config::CoreConfig;
pub use controller::{Controller, ControllerBuilder};
pub use error::{CoreError, GrammarError, MountError, SchemaError};
