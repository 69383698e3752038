//! Entry point: builds typed clients over one shared transport.

use std::sync::Arc;

use crate::client::client::Client;
use crate::client::repo::RepoClient;
use crate::config::Configuration;
use crate::entity::{Entity, WithId, WithUri};
use crate::error::ClientResult;
use crate::proxy::ProxyFactory;
use crate::remote::{ReqwestTransport, RestOperations, Transport};
use crate::resilience::RetryPolicy;

/// Creates `Client<T>` and `RepoClient<T>` instances sharing one configuration.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    configuration: Arc<Configuration>,
    ops: RestOperations,
    proxy_factory: ProxyFactory,
}

impl ClientFactory {
    /// HTTP transport built from the configured timeouts.
    pub fn new(configuration: Arc<Configuration>) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(&configuration.settings().timeouts)?;
        Ok(Self::with_transport(configuration, Arc::new(transport)))
    }

    pub fn with_transport(configuration: Arc<Configuration>, transport: Arc<dyn Transport>) -> Self {
        let ops = RestOperations::new(transport, configuration.clone());
        Self {
            configuration,
            ops,
            proxy_factory: ProxyFactory,
        }
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn rest_operations(&self) -> &RestOperations {
        &self.ops
    }

    /// Client for `T`; fails when `T`'s registration is invalid.
    pub fn create<T: Entity>(&self) -> ClientResult<Client<T>> {
        Client::new(self.ops.clone(), self.proxy_factory)
    }

    /// Repository client for `T`, batching per `client.max_batch_size`.
    pub fn repo<T>(&self) -> ClientResult<RepoClient<T>>
    where
        T: Entity + WithId + WithUri + PartialEq,
    {
        let settings = self.configuration.settings();
        Ok(RepoClient::new(
            self.create::<T>()?,
            settings.client.max_batch_size,
            RetryPolicy::from_config(&settings.retries),
        ))
    }
}
