//! Named registries for instances and services.
//!
//! # Responsibilities
//! - Map names to shared, typed values
//! - Reject empty and duplicate names when the registry is built
//! - Report absent names and wrong types as typed errors
//!
//! # Design Decisions
//! - Built once at startup, read-only afterwards
//! - Values are stored type-erased and downcast on lookup

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

type Entry = Arc<dyn Any + Send + Sync>;

/// Error type for registry construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' is not a {expected}")]
    TypeMismatch {
        kind: &'static str,
        name: String,
        expected: &'static str,
    },

    #[error("{kind} '{name}' registered twice")]
    Duplicate { kind: &'static str, name: String },

    #[error("{kind} registered with an empty name")]
    EmptyName { kind: &'static str },
}

/// Collects entries before validation.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<(String, Entry)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, name: impl Into<String>, value: Arc<T>) {
        let value: Entry = value;
        self.entries.push((name.into(), value));
    }

    /// Validate names and freeze the registry.
    pub fn build(self, kind: &'static str) -> Result<Registry, RegistryError> {
        let mut entries = HashMap::with_capacity(self.entries.len());
        let mut order = Vec::with_capacity(self.entries.len());

        for (name, value) in self.entries {
            if name.is_empty() {
                return Err(RegistryError::EmptyName { kind });
            }
            if entries.contains_key(&name) {
                return Err(RegistryError::Duplicate { kind, name });
            }
            order.push(name.clone());
            entries.insert(name, value);
        }

        Ok(Registry {
            kind,
            entries,
            order,
        })
    }
}

/// Immutable name → value mapping.
pub struct Registry {
    kind: &'static str,
    entries: HashMap<String, Entry>,
    order: Vec<String>,
}

impl Registry {
    /// An empty registry.
    pub fn empty(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Look up an entry by name and type.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        let entry = self.entries.get(name).ok_or_else(|| RegistryError::NotFound {
            kind: self.kind,
            name: name.to_string(),
        })?;

        entry
            .clone()
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                kind: self.kind,
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("names", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Database {
        url: &'static str,
    }

    #[test]
    fn test_typed_lookup() {
        let mut builder = RegistryBuilder::new();
        builder.insert("db", Arc::new(Database { url: "mem://" }));
        builder.insert("counter", Arc::new(42u32));
        let registry = builder.build("instance").unwrap();

        assert_eq!(registry.get::<Database>("db").unwrap().url, "mem://");
        assert_eq!(*registry.get::<u32>("counter").unwrap(), 42);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["db", "counter"]);
    }

    #[test]
    fn test_not_found() {
        let registry = Registry::empty("service");
        assert_eq!(
            registry.get::<u32>("mail").unwrap_err(),
            RegistryError::NotFound {
                kind: "service",
                name: "mail".into()
            }
        );
    }

    #[test]
    fn test_type_mismatch() {
        let mut builder = RegistryBuilder::new();
        builder.insert("counter", Arc::new(42u32));
        let registry = builder.build("instance").unwrap();

        assert!(matches!(
            registry.get::<String>("counter"),
            Err(RegistryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.insert("db", Arc::new(1u8));
        builder.insert("db", Arc::new(2u8));
        assert_eq!(
            builder.build("instance").unwrap_err(),
            RegistryError::Duplicate {
                kind: "instance",
                name: "db".into()
            }
        );

        let mut builder = RegistryBuilder::new();
        builder.insert("", Arc::new(1u8));
        assert!(matches!(
            builder.build("service"),
            Err(RegistryError::EmptyName { .. })
        ));
    }
}
