//! Plain property accessor handler.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::entity::{Entity, Method};
use crate::error::{ClientError, ClientResult};
use crate::hal::support::{decapitalize, to_link_name};
use crate::proxy::handler::{ConditionalMethodHandler, Invocation};

/// Reads and writes the local content; never performs I/O.
///
/// `getName` / `isActive` read the `name` / `active` field; `setName(v)`
/// replaces the `name` field. Any other name reads the field of that name.
/// Only fields present in the serialized content are addressable; anything
/// else is rejected rather than read as null or written into the void.
#[derive(Debug, Default)]
pub struct SimplePropertyMethodHandler;

/// Field name addressed by an accessor, and whether the accessor is a setter.
fn property_of(method_name: &str) -> (String, bool) {
    match method_name.strip_prefix("set").filter(|rest| !rest.is_empty()) {
        Some(rest) => (decapitalize(rest), true),
        None => (to_link_name(method_name), false),
    }
}

impl SimplePropertyMethodHandler {
    fn read<T: Entity>(content: &RwLock<T>, method: &Method, field: &str) -> ClientResult<Value> {
        let document = serde_json::to_value(&*content.read())?;
        document
            .get(field)
            .cloned()
            .ok_or_else(|| unknown_property::<T>(method))
    }

    fn write<T: Entity>(
        content: &RwLock<T>,
        method: &Method,
        field: String,
        value: Value,
    ) -> ClientResult<()> {
        let mut guard = content.write();
        let uri = guard.as_with_uri().and_then(|w| w.uri().cloned());

        let mut document = serde_json::to_value(&*guard)?;
        match &mut document {
            Value::Object(map) => match map.get_mut(&field) {
                Some(slot) => *slot = value,
                None => return Err(unknown_property::<T>(method)),
            },
            _ => {
                return Err(ClientError::protocol(format!(
                    "{} content is not a JSON object",
                    T::KIND
                )))
            }
        }

        let mut updated = T::from_content(guard.content_kind(), document)?;
        if let (Some(uri), Some(target)) = (uri, updated.as_with_uri_mut()) {
            target.set_uri(uri)?;
        }
        *guard = updated;
        Ok(())
    }
}

fn unknown_property<T: Entity>(method: &Method) -> ClientError {
    ClientError::UnsupportedMethod {
        kind: T::KIND.to_string(),
        method: method.name().to_string(),
        expected: "an accessor of an existing property",
    }
}

#[async_trait]
impl<T: Entity> ConditionalMethodHandler<T> for SimplePropertyMethodHandler {
    fn name(&self) -> &'static str {
        "simple property"
    }

    fn supports(&self, method: &Method) -> bool {
        method.is_simple_property()
    }

    async fn invoke(
        &self,
        content: &RwLock<T>,
        method: &Method,
        args: &[Value],
    ) -> ClientResult<Invocation> {
        let (field, setter) = property_of(method.name());
        match (setter, args) {
            (false, []) => Self::read(content, method, &field).map(Invocation::Property),
            (true, [value]) => {
                Self::write(content, method, field, value.clone())?;
                Ok(Invocation::Updated)
            }
            _ => Err(ClientError::UnsupportedMethod {
                kind: T::KIND.to_string(),
                method: method.name().to_string(),
                expected: if setter {
                    "a setter taking one argument"
                } else {
                    "a getter taking no arguments"
                },
            }),
        }
    }
}
