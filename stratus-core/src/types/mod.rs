//! Core domain types for stratus.

pub mod stack;

// Re-exports
pub use stack::{
    CreateStackRequest, KeyMaterial, Parameter, StackDescriptor, StackInfo, StackStatus,
};
