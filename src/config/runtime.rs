//! Runtime client configuration.
//!
//! Holds the base URI, the per-type registrations and a cache of validated
//! entity metadata. One `Configuration` is shared (via `Arc`) by the remote
//! operations and every proxy created from them.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use url::Url;

use crate::client::ClientFactory;
use crate::config::schema::ClientConfig;
use crate::entity::{Entity, EntityDescriptor, MethodTable};
use crate::error::{ClientError, ClientResult};
use crate::hal::append_path;
use crate::type_resolver::{ResourceTypeInfo, TypeResolver};

/// Validated per-type metadata, built once per entity type.
pub struct EntityMetadata {
    pub descriptor: EntityDescriptor,
    pub methods: Arc<MethodTable>,
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
    accepts_kind: fn(&str) -> bool,
}

impl EntityMetadata {
    fn build<T: Entity>(registered: Option<ResourceTypeInfo>) -> ClientResult<Self> {
        let descriptor = T::descriptor();
        let methods = T::methods().build()?;
        let type_resolver = match registered.or_else(T::type_info) {
            Some(info) => {
                info.validate(&descriptor, T::accepts_kind)?;
                Some(info.into_resolver())
            }
            None => None,
        };
        Ok(Self {
            descriptor,
            methods: Arc::new(methods),
            type_resolver,
            accepts_kind: T::accepts_kind,
        })
    }

    /// True when `kind` is this type or one of its subtypes.
    pub fn accepts_kind(&self, kind: &str) -> bool {
        (self.accepts_kind)(kind)
    }
}

impl fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("descriptor", &self.descriptor)
            .field("methods", &self.methods.len())
            .field("polymorphic", &self.type_resolver.is_some())
            .finish()
    }
}

/// Client configuration shared by all clients and proxies of one factory.
pub struct Configuration {
    base_uri: Url,
    settings: ClientConfig,
    type_infos: HashMap<&'static str, ResourceTypeInfo>,
    metadata: DashMap<TypeId, Arc<EntityMetadata>>,
    kinds: DashMap<&'static str, Arc<EntityMetadata>>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Build from file configuration; the base URI is `client.location`.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::builder().settings(config.clone()).build()
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    pub fn settings(&self) -> &ClientConfig {
        &self.settings
    }

    /// URI of the batch save endpoint.
    pub fn batch_uri(&self) -> Url {
        append_path(&self.base_uri, &self.settings.client.batch_path)
    }

    /// Validated metadata of `T`, built and cached on first use.
    pub fn metadata<T: Entity>(&self) -> ClientResult<Arc<EntityMetadata>> {
        let key = TypeId::of::<T>();
        if let Some(existing) = self.metadata.get(&key) {
            return Ok(existing.value().clone());
        }

        let built = Arc::new(EntityMetadata::build::<T>(
            self.type_infos.get(T::KIND).cloned(),
        )?);
        let metadata = self.metadata.entry(key).or_insert(built).value().clone();
        self.kinds.insert(T::KIND, metadata.clone());
        Ok(metadata)
    }

    /// True when `candidate` is `declared` or one of its registered subtypes.
    pub fn is_subtype(&self, declared: &str, candidate: &str) -> bool {
        declared == candidate
            || self
                .kinds
                .get(declared)
                .map(|metadata| metadata.accepts_kind(candidate))
                .unwrap_or(false)
    }

    /// Turn this configuration into a factory for clients.
    pub fn build_client_factory(self) -> ClientResult<ClientFactory> {
        ClientFactory::new(Arc::new(self))
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("base_uri", &self.base_uri.as_str())
            .field("settings", &self.settings)
            .field("registered_types", &self.type_infos.len())
            .field("cached_entities", &self.metadata.len())
            .finish()
    }
}

type Registration = fn(&Configuration) -> ClientResult<()>;

fn register<T: Entity>(configuration: &Configuration) -> ClientResult<()> {
    configuration.metadata::<T>().map(drop)
}

/// Builder for `Configuration`; registration errors surface from `build`.
#[derive(Default)]
pub struct ConfigurationBuilder {
    base_uri: Option<Url>,
    settings: ClientConfig,
    type_infos: HashMap<&'static str, ResourceTypeInfo>,
    registrations: Vec<Registration>,
    errors: Vec<String>,
}

impl ConfigurationBuilder {
    /// Base URI of the service; overrides `client.location`.
    #[must_use]
    pub fn base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    /// Base URI given as text.
    #[must_use]
    pub fn location(mut self, location: &str) -> Self {
        match Url::parse(location) {
            Ok(uri) => self.base_uri = Some(uri),
            Err(e) => self
                .errors
                .push(format!("invalid location '{}': {}", location, e)),
        }
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: ClientConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Register polymorphism info for declared type `T`, replacing `T::type_info()`.
    #[must_use]
    pub fn resource_type<T: Entity>(mut self, info: ResourceTypeInfo) -> Self {
        if let Err(e) = info.validate(&T::descriptor(), T::accepts_kind) {
            self.errors.push(e.to_string());
        }
        self.type_infos.insert(T::KIND, info);
        self.registrations.push(register::<T>);
        self
    }

    /// Validate `T` eagerly at build time instead of on first use.
    #[must_use]
    pub fn entity<T: Entity>(mut self) -> Self {
        self.registrations.push(register::<T>);
        self
    }

    pub fn build(self) -> ClientResult<Configuration> {
        if !self.errors.is_empty() {
            return Err(ClientError::configuration(self.errors.join("; ")));
        }

        let base_uri = match self.base_uri {
            Some(uri) => uri,
            None => Url::parse(&self.settings.client.location)
                .map_err(|e| ClientError::invalid_uri(&self.settings.client.location, e))?,
        };

        let configuration = Configuration {
            base_uri,
            settings: self.settings,
            type_infos: self.type_infos,
            metadata: DashMap::new(),
            kinds: DashMap::new(),
        };
        for registration in self.registrations {
            registration(&configuration)?;
        }

        tracing::debug!(
            base_uri = %configuration.base_uri,
            registered_types = configuration.type_infos.len(),
            "Client configuration built"
        );
        Ok(configuration)
    }
}
