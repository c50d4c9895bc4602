//! Tool catalog and invocation results.

pub mod errors;
mod registry;
mod types;

pub use errors::{InvocationError, RegistryError, ValidationError};
pub use registry::ToolRegistry;
pub use types::{ToolDescriptor, ToolInvocationResult};
