//! Repository-style client: save with conflict recovery, buffered batches.
//!
//! # Responsibilities
//! - `get` / `get_all` / `find_all` / `find_by_natural_id` (retried reads)
//! - `save`: POST, recover from 409 by locating and patching the existing resource
//! - Back-fill the id from the created resource's URI
//! - `persist` / `flush`: buffer entities and save them in one batch call
//!
//! # Design Decisions
//! - Conflict recovery is best-effort, not transactional
//! - A patched resource that still differs from the entity is a `Reconciliation` error
//! - Only idempotent reads go through the retry policy

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::client::batch::CollectionDto;
use crate::client::client::Client;
use crate::entity::{Entity, WithId, WithUri};
use crate::error::{ClientError, ClientResult};
use crate::hal::{resolve_self_uri, Resource};
use crate::proxy::Proxy;
use crate::resilience::RetryPolicy;

/// A natural key looked up through `<base>/search/<path>?<name>=<value>`.
pub struct NaturalId<T> {
    path: String,
    name: String,
    extract: Arc<dyn Fn(&T) -> String + Send + Sync>,
}

impl<T> NaturalId<T> {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        extract: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            extract: Arc::new(extract),
        }
    }
}

impl<T> Clone for NaturalId<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            name: self.name.clone(),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<T> fmt::Debug for NaturalId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaturalId")
            .field("path", &self.path)
            .field("name", &self.name)
            .finish()
    }
}

/// Repository operations over a `Client<T>`.
pub struct RepoClient<T: Entity> {
    client: Client<T>,
    queue: CollectionDto<T>,
    max_size: usize,
    natural_id: Option<NaturalId<T>>,
    retry: RetryPolicy,
}

impl<T> RepoClient<T>
where
    T: Entity + WithId + WithUri + PartialEq,
{
    pub(crate) fn new(client: Client<T>, max_size: usize, retry: RetryPolicy) -> Self {
        Self {
            client,
            queue: CollectionDto::new(),
            max_size: max_size.max(1),
            natural_id: None,
            retry,
        }
    }

    #[must_use]
    pub fn with_natural_id(mut self, natural_id: NaturalId<T>) -> Self {
        self.natural_id = Some(natural_id);
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    /// Entities buffered by `persist` and not yet flushed.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// The member `<base>/<id>`; 404 yields `None`.
    pub async fn get(&self, id: &T::Id) -> ClientResult<Option<Proxy<T>>> {
        let uri = self.client.member_uri(id);
        self.retry.execute(&uri, || self.client.get(&uri)).await
    }

    pub async fn get_all(&self) -> ClientResult<Vec<Proxy<T>>> {
        let uri = self.client.base_uri().clone();
        self.retry.execute(&uri, || self.client.get_all()).await
    }

    pub async fn find_all(&self) -> ClientResult<Vec<Proxy<T>>> {
        let uri = self.client.base_uri().clone();
        self.retry.execute(&uri, || self.client.find_all()).await
    }

    /// Look up the stored resource sharing `entity`'s natural id.
    pub async fn find_by_natural_id(&self, entity: &T) -> ClientResult<Option<Proxy<T>>> {
        let natural_id = self
            .natural_id
            .as_ref()
            .ok_or_else(|| ClientError::NaturalIdNotRegistered {
                kind: T::KIND.to_string(),
            })?;
        let value = (natural_id.extract)(entity);
        let uri = self.client.search_uri(&natural_id.path, &natural_id.name, &value);
        self.retry
            .execute(&uri, || {
                self.client
                    .search(&natural_id.path, &natural_id.name, &value)
            })
            .await
    }

    /// Create `entity` and return it with its URI and id filled in.
    ///
    /// On 409 the existing resource is located (natural id, else the entity's
    /// own URI or id) and patched when it differs. Without a way to locate it
    /// the conflict is returned.
    pub async fn save(&self, mut entity: T) -> ClientResult<T> {
        let uri = match self.client.post(&entity).await {
            Ok(uri) => uri,
            Err(conflict) if conflict.is_conflict() => {
                tracing::warn!(
                    kind = T::KIND,
                    error = %conflict,
                    "Save conflicted, assuming the entity is already persisted"
                );
                self.recover_conflict(&entity, conflict).await?
            }
            Err(e) => return Err(e),
        };

        entity.set_uri(uri.clone())?;
        if entity.id().is_none() {
            let parsed = uri
                .path_segments()
                .and_then(|segments| segments.last())
                .and_then(|segment| segment.parse::<T::Id>().ok());
            match parsed {
                Some(id) => entity.set_id(id),
                None => {
                    tracing::debug!(uri = %uri, kind = T::KIND, "Fetching created resource for its id");
                    let fetched = self
                        .client
                        .get(&uri)
                        .await?
                        .ok_or_else(|| {
                            ClientError::protocol(format!("created resource {} is not readable", uri))
                        })?
                        .to_content();
                    if fetched.id().is_none() {
                        return Err(ClientError::protocol(format!(
                            "created resource {} carries no id",
                            uri
                        )));
                    }
                    entity = fetched;
                }
            }
        }
        Ok(entity)
    }

    async fn recover_conflict(&self, entity: &T, conflict: ClientError) -> ClientResult<Url> {
        let existing = if self.natural_id.is_some() {
            self.find_by_natural_id(entity).await?
        } else if let Some(uri) = self.client.entity_uri(entity) {
            self.client.get(&uri).await?
        } else {
            return Err(conflict);
        };
        let Some(existing) = existing else {
            return Err(conflict);
        };

        let existing_uri = match existing.resource_id().await? {
            Some(uri) => uri,
            None => existing
                .self_uri()
                .cloned()
                .ok_or_else(|| ClientError::protocol("conflicting resource has no URI"))?,
        };

        if existing.to_content() != *entity {
            tracing::info!(uri = %existing_uri, kind = T::KIND, "Patching existing resource");
            let patched = match self.client.patch(&existing_uri, entity).await? {
                Some(patched) => patched,
                None => self.client.get(&existing_uri).await?.ok_or_else(|| {
                    ClientError::Reconciliation {
                        uri: existing_uri.clone(),
                        message: "patched resource disappeared".into(),
                    }
                })?,
            };
            if patched.to_content() != *entity {
                return Err(ClientError::Reconciliation {
                    uri: existing_uri,
                    message: format!("patched {} still differs from the saved entity", T::KIND),
                });
            }
        }
        Ok(existing_uri)
    }

    /// DELETE the entity at its URI (or `<base>/<id>`).
    pub async fn delete(&self, entity: &T) -> ClientResult<()> {
        let uri = self.client.entity_uri(entity).ok_or_else(|| {
            ClientError::protocol(format!("cannot delete {} without a URI or id", T::KIND))
        })?;
        self.client.delete(&uri).await
    }

    pub async fn delete_all(&self, entities: &[T]) -> ClientResult<()> {
        for entity in entities {
            self.delete(entity).await?;
        }
        Ok(())
    }

    /// Buffer `entity`; flushes once `max_size` entities are pending.
    ///
    /// Returns the saved entities when a flush happened, else nothing.
    pub async fn persist(&mut self, entity: T) -> ClientResult<Vec<T>> {
        self.queue.push(entity);
        if self.queue.len() >= self.max_size {
            return self.flush().await;
        }
        Ok(Vec::new())
    }

    pub async fn persist_all(
        &mut self,
        entities: impl IntoIterator<Item = T>,
    ) -> ClientResult<Vec<T>> {
        let mut flushed = Vec::new();
        for entity in entities {
            flushed.extend(self.persist(entity).await?);
        }
        Ok(flushed)
    }

    /// Save every pending entity in one batch call.
    ///
    /// On failure the pending entities stay queued.
    pub async fn flush(&mut self) -> ClientResult<Vec<T>> {
        if self.queue.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self.queue.take();
        let saved = match self.client.save_all(&batch).await {
            Ok(saved) => saved,
            Err(e) => {
                self.queue = batch;
                return Err(e);
            }
        };
        let base = self.client.rest_operations().configuration().base_uri().clone();
        saved
            .into_iter()
            .map(|resource| into_entity(resource, &base))
            .collect()
    }

    /// Save `entities` in a single batch, whatever `max_size` is.
    pub async fn save_all(&mut self, entities: Vec<T>) -> ClientResult<Vec<T>> {
        let previous = self.max_size;
        self.max_size = self.queue.len() + entities.len();
        let result = self.persist_all(entities).await;
        self.max_size = previous;
        result
    }
}

impl<T: Entity> fmt::Debug for RepoClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoClient")
            .field("client", &self.client)
            .field("pending", &self.queue.len())
            .field("max_size", &self.max_size)
            .field("natural_id", &self.natural_id)
            .finish()
    }
}

fn into_entity<T: Entity + WithUri>(resource: Resource<T>, base: &Url) -> ClientResult<T> {
    let Resource { mut content, links } = resource;
    if let Some(uri) = resolve_self_uri(&links, base)? {
        content.set_uri(uri)?;
    }
    Ok(content)
}
