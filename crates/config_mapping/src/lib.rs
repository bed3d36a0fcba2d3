//! Typed configuration mapping.
//!
//! This crate binds flat key/value configuration properties such as
//! `graph.client-id=secret` onto typed mappings. A mapping is described by a
//! [`MappingDescriptor`]: a prefix plus an ordered list of members, each with
//! a type and an optional default. The [`MappingEngine`] resolves every
//! member against a [`PropertySnapshot`] and either returns a complete,
//! immutable [`ResolvedMapping`] or a [`MappingError`] listing every member
//! that could not be resolved.
//!
//! # Components
//!
//! * [`property_name`] derives key segments from member names
//!   (`getClientId` → `client-id`)
//! * [`coerce`] converts raw strings into scalars or composite types
//! * [`bind_sequence`] binds indexed (`pets[0]`) or comma separated sequences
//!   and [`bind_map`] binds map members
//! * [`DefaultResolver`] supplies literal, computed and expression defaults
//! * [`MappingEngine`] orchestrates resolution and keeps the descriptor registry
//!
//! # Examples
//!
//! ```rust
//! use config_mapping::{
//!     DefaultValue, MappingDescriptor, MappingEngine, MemberDescriptor, PropertySnapshot,
//!     ScalarType,
//! };
//!
//! let descriptor = MappingDescriptor::builder("GraphOption", "graph")
//!     .member(
//!         MemberDescriptor::single("getBaseUrl", ScalarType::String)
//!             .with_default(DefaultValue::literal("url")),
//!     )
//!     .member(MemberDescriptor::single("getTenant", ScalarType::String))
//!     .member(MemberDescriptor::single("getClientId", ScalarType::String))
//!     .build()?;
//!
//! let snapshot = PropertySnapshot::new()
//!     .with("graph.tenant", "tenant")
//!     .with("graph.client-id", "id");
//!
//! let engine = MappingEngine::new();
//! let mapping = engine.build(&descriptor, "graph", &snapshot)?;
//!
//! assert_eq!(mapping.value::<String>("getBaseUrl")?, "url");
//! assert_eq!(mapping.value::<String>("client-id")?, "id");
//! # Ok::<(), config_mapping::ConfigurationError>(())
//! ```

pub mod coercion;
pub mod collections;
pub mod declaration;
pub mod defaults;
pub mod descriptor;
pub mod engine;
pub mod errors;
pub mod mapping;
pub mod property_name;
pub mod snapshot;
pub mod value;


pub use coercion::coerce;
pub use collections::{
    bind_map, bind_sequence, indexed_group_count, map_group_names, parse_sequence, split_list,
};
pub use declaration::{MappingDeclaration, MemberDeclaration, MemberShape, TypeRegistry};
pub use defaults::{ComputedDefault, DefaultResolver, DefaultValue, Expression, PartialMapping};
pub use descriptor::{
    join_key, MappingDescriptor, MappingDescriptorBuilder, MemberDescriptor, MemberKind,
};
pub use engine::{MappingEngine, MappingKey};
pub use errors::{
    CoercionError, ConfigurationError, ConfigurationResult, FailureCause, MappingError,
    MemberFailure,
};
pub use mapping::{ConfigMapping, ResolvedMapping, ResolvedMember};
pub use property_name::{property_name, NamingStrategy};
pub use snapshot::PropertySnapshot;
pub use value::{Composite, CompositeType, CompositeValue, FromValue, ScalarType, Value, ValueType};
