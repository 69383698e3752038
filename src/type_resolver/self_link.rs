//! Subtype resolution by self-link prefix.

use crate::config::Configuration;
use crate::entity::EntityDescriptor;
use crate::error::{ClientError, ClientResult};
use crate::hal::{append_path, resolve_self_uri, Links};
use crate::type_resolver::TypeResolver;

/// Picks the first subtype whose collection path prefixes the self link.
///
/// A resource at `http://host/girls/42` resolves to the subtype registered at
/// `/girls`. Without a self link, or when no candidate matches, the declared
/// type is kept.
#[derive(Debug, Clone)]
pub struct SelfLinkTypeResolver {
    subtypes: Vec<EntityDescriptor>,
}

impl SelfLinkTypeResolver {
    pub fn new(subtypes: Vec<EntityDescriptor>) -> Self {
        Self { subtypes }
    }
}

impl TypeResolver for SelfLinkTypeResolver {
    fn resolve_type(
        &self,
        declared: &EntityDescriptor,
        links: &Links,
        configuration: &Configuration,
    ) -> ClientResult<&'static str> {
        let base = configuration.base_uri();
        let Some(self_uri) = resolve_self_uri(links, base)? else {
            return Ok(declared.kind);
        };
        let self_uri = self_uri.as_str();

        for candidate in &self.subtypes {
            let Some(path) = candidate.resource_path else {
                continue;
            };
            let collection = append_path(base, path);
            let prefix = format!("{}/", collection.as_str().trim_end_matches('/'));
            if self_uri.starts_with(&prefix) {
                if !configuration.is_subtype(declared.kind, candidate.kind) {
                    return Err(ClientError::configuration(format!(
                        "{} is not a subtype of {}",
                        candidate, declared
                    )));
                }
                tracing::trace!(
                    declared = declared.kind,
                    resolved = candidate.kind,
                    self_uri,
                    "Resolved resource type from self link"
                );
                return Ok(candidate.kind);
            }
        }
        Ok(declared.kind)
    }
}
