//! Blueprint: the constructor side of the prototype layer.
//!
//! [`extend`] builds a prototype from a definition closure and returns a
//! [`Blueprint`]. The closure receives the new prototype to populate and,
//! when deriving, the base prototype for explicit super-dispatch: capture
//! the base method's `Arc` and call it, instead of relying on an implicit
//! super keyword.

use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::prototype::{Instance, Prototype};

/// A constructor for instances sharing one prototype chain.
pub struct Blueprint {
    proto: Arc<Prototype>,
}

/// Build a root blueprint from a definition closure.
pub fn extend<F>(definition: F) -> Blueprint
where
    F: FnOnce(&mut Prototype, Option<&Prototype>),
{
    Blueprint::derive(None, definition)
}

impl Blueprint {
    fn derive<F>(base: Option<Arc<Prototype>>, definition: F) -> Blueprint
    where
        F: FnOnce(&mut Prototype, Option<&Prototype>),
    {
        let mut proto = Prototype::new(base.clone());
        definition(&mut proto, base.as_deref());
        debug!(members = proto.own_len(), derived = base.is_some(), "blueprint built");
        Blueprint {
            proto: Arc::new(proto),
        }
    }

    /// Derive a new blueprint whose prototype chains onto this one.
    pub fn extend<F>(&self, definition: F) -> Blueprint
    where
        F: FnOnce(&mut Prototype, Option<&Prototype>),
    {
        Blueprint::derive(Some(Arc::clone(&self.proto)), definition)
    }

    /// Construct an instance sharing (not copying) the prototype.
    ///
    /// If the chain defines an `init` method it runs once with the
    /// constructor arguments.
    pub fn construct(&self, args: &[Value]) -> Instance {
        let instance = Instance::new(Arc::clone(&self.proto));
        if let Some(init) = self.proto.method("init") {
            init(&instance, args);
        }
        instance
    }

    /// Access the blueprint's prototype.
    pub fn prototype(&self) -> &Prototype {
        &self.proto
    }
}

impl Clone for Blueprint {
    fn clone(&self) -> Self {
        Self {
            proto: Arc::clone(&self.proto),
        }
    }
}

impl Debug for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint")
            .field("proto", &self.proto)
            .finish()
    }
}
