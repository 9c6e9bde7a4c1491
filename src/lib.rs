//! Command-line build orchestration for Unity projects.
//!
//! The editor is driven in batch mode: helper scripts are injected into the
//! project, a chain of static methods is run through a dispatcher, and the
//! scripts are removed again afterwards. Exported android and Xcode projects
//! are packaged with gradle and xcodebuild.

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod fsops;
pub mod invoker;
pub mod logging;
pub mod pipelines;
pub mod target;
pub mod templates;

pub use error::{exit_code_of, BuildError};
