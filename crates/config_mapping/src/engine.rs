//! Mapping engine.
//!
//! The engine turns a [`MappingDescriptor`] and a [`PropertySnapshot`] into a
//! [`ResolvedMapping`]. Members are resolved one by one in declaration order:
//!
//! 1. The full key is `prefix.segment`
//! 2. Sequences are bound from indexed keys or a comma separated value
//! 3. Nested mappings are resolved under `prefix.segment`; sequences and
//!    maps of them append `[i]` or `.<name>` to that key
//! 4. Other members are looked up and converted
//! 5. Unset members fall back to their default; a required member without
//!    one is recorded as missing and resolution carries on
//! 6. If any member failed the whole build fails with every failure listed
//!
//! The engine also keeps a registry of descriptors keyed by type and prefix.
//! Registration is insert-if-absent, so registering the same type and prefix
//! twice keeps the first descriptor.
//!
//! # Examples
//!
//! ```rust
//! use config_mapping::{
//!     DefaultValue, MappingDescriptor, MappingEngine, MemberDescriptor, PropertySnapshot,
//!     ScalarType, Value,
//! };
//!
//! let descriptor = MappingDescriptor::builder("Server", "server")
//!     .member(MemberDescriptor::single("host", ScalarType::String))
//!     .member(
//!         MemberDescriptor::single("serverUrl", ScalarType::String).with_default(
//!             DefaultValue::computed(|mapping| {
//!                 let host: String = mapping.value("host")?;
//!                 Ok(Value::String(format!("https://{}", host)))
//!             }),
//!         ),
//!     )
//!     .build()?;
//!
//! let snapshot = PropertySnapshot::new().with("server.host", "localhost");
//! let mapping = MappingEngine::new().build(&descriptor, "server", &snapshot)?;
//!
//! assert_eq!(mapping.value::<String>("serverUrl")?, "https://localhost");
//! # Ok::<(), config_mapping::ConfigurationError>(())
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, instrument, warn};

use crate::coercion::coerce;
use crate::collections::{bind_map, bind_sequence, indexed_group_count, map_group_names};
use crate::defaults::{DefaultResolver, PartialMapping};
use crate::descriptor::{join_key, MappingDescriptor, MemberDescriptor, MemberKind};
use crate::errors::{
    CoercionError, ConfigurationError, ConfigurationResult, FailureCause, MappingError,
    MemberFailure,
};
use crate::mapping::{ConfigMapping, ResolvedMapping, ResolvedMember};
use crate::snapshot::PropertySnapshot;
use crate::value::Value;

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

/// Registry key of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingKey {
    pub type_name: String,
    pub prefix: String,
}

impl MappingKey {
    pub fn new(type_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            prefix: prefix.into(),
        }
    }
}

/// Builds resolved mappings and keeps the descriptor registry.
///
/// Cloning the engine shares the registry. Builds do not touch the registry
/// and can run concurrently.
#[derive(Debug, Clone, Default)]
pub struct MappingEngine {
    registry: Arc<RwLock<HashMap<MappingKey, Arc<MappingDescriptor>>>>,
}

/// Outcome of resolving one member.
enum Resolution {
    Resolved(Value),
    Failed(Vec<MemberFailure>),
}

impl MappingEngine {
    /// Creates an engine with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under its type name and default prefix.
    ///
    /// If the key is already registered the existing descriptor is returned
    /// and `descriptor` is dropped.
    pub fn register(&self, descriptor: MappingDescriptor) -> Arc<MappingDescriptor> {
        let key = MappingKey::new(descriptor.type_name(), descriptor.prefix());
        self.insert_if_absent(key, descriptor)
    }

    /// Returns the descriptor registered for `type_name` and `prefix`.
    pub fn descriptor(&self, type_name: &str, prefix: &str) -> Option<Arc<MappingDescriptor>> {
        let key = MappingKey::new(type_name, prefix);
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Returns the registered descriptor, creating it with `create` on first use.
    ///
    /// `create` may run more than once when callers race, but only the first
    /// descriptor to be inserted is kept.
    pub fn get_or_register<F>(
        &self,
        type_name: &str,
        prefix: &str,
        create: F,
    ) -> ConfigurationResult<Arc<MappingDescriptor>>
    where
        F: FnOnce() -> ConfigurationResult<MappingDescriptor>,
    {
        if let Some(existing) = self.descriptor(type_name, prefix) {
            return Ok(existing);
        }

        info!(type_name, prefix, "Registering mapping descriptor on first use");
        let descriptor = create()?;
        Ok(self.insert_if_absent(MappingKey::new(type_name, prefix), descriptor))
    }

    fn insert_if_absent(
        &self,
        key: MappingKey,
        descriptor: MappingDescriptor,
    ) -> Arc<MappingDescriptor> {
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = registry.get(&key) {
            debug!(
                type_name = %key.type_name,
                prefix = %key.prefix,
                "Descriptor already registered, keeping existing entry"
            );
            return existing.clone();
        }

        debug!(type_name = %key.type_name, prefix = %key.prefix, "Descriptor registered");
        let descriptor = Arc::new(descriptor);
        registry.insert(key, descriptor.clone());
        descriptor
    }

    /// Number of registered descriptors.
    pub fn registered_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Builds a mapping from a registered descriptor.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::UnregisteredMapping` if nothing is registered for the key
    /// * `ConfigurationError::BuildFailed` if any member fails to resolve
    pub fn build_registered(
        &self,
        type_name: &str,
        prefix: &str,
        snapshot: &PropertySnapshot,
    ) -> ConfigurationResult<ResolvedMapping> {
        let descriptor = self.descriptor(type_name, prefix).ok_or_else(|| {
            ConfigurationError::UnregisteredMapping {
                type_name: type_name.to_string(),
                prefix: prefix.to_string(),
            }
        })?;
        Ok(self.build(&descriptor, prefix, snapshot)?)
    }

    /// Builds a typed mapping under the type's default prefix.
    pub fn mapping<T: ConfigMapping>(&self, snapshot: &PropertySnapshot) -> ConfigurationResult<T> {
        self.mapping_with_prefix::<T>(T::PREFIX, snapshot)
    }

    /// Builds a typed mapping under an explicit prefix.
    ///
    /// The descriptor is registered for `(T, prefix)` on first use.
    pub fn mapping_with_prefix<T: ConfigMapping>(
        &self,
        prefix: &str,
        snapshot: &PropertySnapshot,
    ) -> ConfigurationResult<T> {
        let descriptor =
            self.get_or_register(std::any::type_name::<T>(), prefix, T::descriptor)?;
        let mapping = self.build(&descriptor, prefix, snapshot)?;
        T::from_mapping(&mapping)
    }

    /// Resolves every member of `descriptor` under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns a `MappingError` listing every member that could not be
    /// resolved. No partially resolved mapping is ever returned.
    #[instrument(
        skip_all,
        fields(type_name = %descriptor.type_name(), prefix = %prefix)
    )]
    pub fn build(
        &self,
        descriptor: &MappingDescriptor,
        prefix: &str,
        snapshot: &PropertySnapshot,
    ) -> Result<ResolvedMapping, MappingError> {
        debug!(
            members = descriptor.members().len(),
            "Starting mapping resolution"
        );

        let result = resolve_mapping(descriptor, prefix, snapshot);
        match &result {
            Ok(_) => debug!("Mapping resolved"),
            Err(e) => warn!(failures = e.failures.len(), "Mapping resolution failed: {}", e),
        }
        result
    }
}

fn resolve_mapping(
    descriptor: &MappingDescriptor,
    prefix: &str,
    snapshot: &PropertySnapshot,
) -> Result<ResolvedMapping, MappingError> {
    let mut defaults = DefaultResolver::new();
    let mut resolved: Vec<Option<Value>> = Vec::with_capacity(descriptor.members().len());
    let mut failures = Vec::new();

    for (position, member) in descriptor.members().iter().enumerate() {
        let key = join_key(prefix, member.key());
        let partial = PartialMapping::new(descriptor, position, &resolved);

        let resolution = resolve_member(member, &key, snapshot, &mut defaults, &partial);
        match resolution {
            Resolution::Resolved(value) => {
                debug!(member = member.name(), key = %key, "Member resolved");
                resolved.push(Some(value));
            }
            Resolution::Failed(member_failures) => {
                debug!(member = member.name(), key = %key, "Member failed to resolve");
                failures.extend(member_failures);
                resolved.push(None);
            }
        }
    }

    if !failures.is_empty() {
        return Err(MappingError {
            type_name: descriptor.type_name().to_string(),
            prefix: prefix.to_string(),
            failures,
        });
    }

    let members = descriptor
        .members()
        .iter()
        .zip(resolved)
        .filter_map(|(member, value)| {
            value.map(|value| ResolvedMember {
                name: member.name().to_string(),
                segment: member.key().to_string(),
                key: join_key(prefix, member.key()),
                value,
            })
        })
        .collect();

    Ok(ResolvedMapping::new(descriptor.type_name(), prefix, members))
}

fn resolve_member(
    member: &MemberDescriptor,
    key: &str,
    snapshot: &PropertySnapshot,
    defaults: &mut DefaultResolver,
    partial: &PartialMapping<'_>,
) -> Resolution {
    let fail = |cause: FailureCause| {
        Resolution::Failed(vec![MemberFailure {
            member: member.name().to_string(),
            key: key.to_string(),
            expected: member.kind().type_name(),
            cause,
        }])
    };

    let configured: Option<Result<Value, CoercionError>> = match member.kind() {
        MemberKind::Group(group) => {
            return match resolve_mapping(group, key, snapshot) {
                Ok(mapping) => Resolution::Resolved(Value::Group(mapping)),
                Err(nested) => Resolution::Failed(nested.failures),
            };
        }
        MemberKind::GroupSequence(group) | MemberKind::OptionalGroupSequence(group) => {
            let count = indexed_group_count(snapshot, key);
            if count == 0 {
                return if member.kind().is_optional() {
                    Resolution::Resolved(Value::Absent)
                } else {
                    fail(FailureCause::MissingProperty)
                };
            }
            debug!(key, count, "Binding sequence of nested mappings");
            let elements = (0..count).map(|i| (format!("{}[{}]", key, i), ()));
            return match resolve_groups(group, elements, snapshot) {
                Ok(values) => Resolution::Resolved(Value::List(
                    values.into_iter().map(|(_, value)| value).collect(),
                )),
                Err(failures) => Resolution::Failed(failures),
            };
        }
        MemberKind::GroupMap(group) => {
            let elements = map_group_names(snapshot, key)
                .into_iter()
                .map(|name| (join_key(key, &name), name));
            return match resolve_groups(group, elements, snapshot) {
                Ok(values) => Resolution::Resolved(Value::Map(values.into_iter().collect())),
                Err(failures) => Resolution::Failed(failures),
            };
        }
        MemberKind::Map(element) => {
            return match bind_map(snapshot, key, element) {
                Ok(entries) => Resolution::Resolved(Value::Map(entries)),
                Err(e) => fail(FailureCause::Coercion(e)),
            };
        }
        MemberKind::Sequence(element) | MemberKind::OptionalSequence(element) => {
            bind_sequence(snapshot, key, element)
                .map(|items| items.map(Value::List))
                .transpose()
        }
        MemberKind::Single(value_type) | MemberKind::Optional(value_type) => snapshot
            .get(key)
            .filter(|raw| !raw.is_empty())
            .map(|raw| coerce(raw, value_type)),
    };

    let value = match configured {
        Some(result) => result,
        None => match defaults.resolve(member, partial) {
            Some(result) => result,
            None if member.kind().is_optional() => Ok(Value::Absent),
            None => return fail(FailureCause::MissingProperty),
        },
    };

    match value {
        Ok(value) => Resolution::Resolved(value),
        Err(e) => fail(FailureCause::Coercion(e)),
    }
}

/// Resolves one nested mapping per `(prefix, tag)` element.
///
/// Every element is resolved even after a failure so that all nested
/// failures are reported together.
fn resolve_groups<T>(
    group: &MappingDescriptor,
    elements: impl Iterator<Item = (String, T)>,
    snapshot: &PropertySnapshot,
) -> Result<Vec<(T, Value)>, Vec<MemberFailure>> {
    let mut values = Vec::new();
    let mut failures = Vec::new();
    for (prefix, tag) in elements {
        match resolve_mapping(group, &prefix, snapshot) {
            Ok(mapping) => values.push((tag, Value::Group(mapping))),
            Err(nested) => failures.extend(nested.failures),
        }
    }

    if failures.is_empty() {
        Ok(values)
    } else {
        Err(failures)
    }
}
