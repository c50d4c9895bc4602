//! Catalog of tools exposed by one connected service.

use std::collections::BTreeMap;
use std::fmt;

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::warn;

use super::{RegistryError, ToolDescriptor, ValidationError};

struct Entry {
    descriptor: ToolDescriptor,
    /// `None` when the advertised schema does not compile.
    validator: Option<JSONSchema>,
}

/// Name → descriptor map with a compiled argument validator per tool.
///
/// A registry is immutable; re-listing builds a new one and swaps it in.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Entry>,
}

impl ToolRegistry {
    /// A registry with no tools.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting listings with repeated names.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = ToolDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut tools = BTreeMap::new();
        for descriptor in descriptors {
            if tools.contains_key(&descriptor.name) {
                return Err(RegistryError::DuplicateName(descriptor.name));
            }

            let validator = match JSONSchema::compile(&descriptor.input_schema) {
                Ok(validator) => Some(validator),
                Err(e) => {
                    warn!(tool = %descriptor.name, error = %e, "input schema does not compile; arguments will not be validated");
                    None
                }
            };

            tools.insert(
                descriptor.name.clone(),
                Entry {
                    descriptor,
                    validator,
                },
            );
        }
        Ok(Self { tools })
    }

    /// Build a registry from an MCP `tools/list` response.
    pub fn from_tools(tools: Vec<mcp::Tool>) -> Result<Self, RegistryError> {
        Self::from_descriptors(tools.into_iter().map(ToolDescriptor::from))
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|entry| &entry.descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Descriptors in name order; this is the catalog offered to a backend.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().map(|entry| &entry.descriptor)
    }

    /// Check that `name` is registered and `arguments` satisfy its schema.
    pub fn validate(&self, name: &str, arguments: &Value) -> Result<(), ValidationError> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| ValidationError::UnknownTool(name.to_string()))?;

        let Some(validator) = &entry.validator else {
            return Ok(());
        };

        if let Err(errors) = validator.validate(arguments) {
            let reason = errors
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ValidationError::InvalidArguments {
                tool: name.to_string(),
                reason,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
