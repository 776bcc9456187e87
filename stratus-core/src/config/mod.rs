//! Stack config file parsing.
//!
//! The stack config is an INI file with one section per stack. Each section
//! names the template to deploy, an optional parameters file, capabilities,
//! the stacks it depends on, and key pairs to provision ahead of deployment.

pub mod parser;


pub use parser::StackConfigParser;
