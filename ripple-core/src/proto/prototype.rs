//! Prototype and Instance
//!
//! A Prototype is an ordered map of members (methods, signals, properties)
//! with an optional base prototype; member lookup walks the chain. An
//! Instance shares its prototype and carries its own field map.
//!
//! The member value type is [`serde_json::Value`]: this layer is
//! dynamically typed by nature, and a JSON value is the established
//! dynamic value in this codebase.
//!
//! # Sharing
//!
//! Runner members (signals, properties) live on the prototype and are
//! therefore shared between every instance constructed from it.
//! Per-instance state belongs in instance fields.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Error;
use crate::runner::{Property, Signal};

/// A method bound to the prototype chain. Receives the instance it was
/// invoked on and the call arguments.
pub type Method = Arc<dyn Fn(&Instance, &[Value]) -> Value + Send + Sync>;

/// A member of a prototype.
pub enum Member {
    /// A callable method.
    Method(Method),
    /// An event channel shared by the prototype's instances.
    Signal(Signal<Value>),
    /// A change-suppressed value shared by the prototype's instances.
    Property(Property<Value>),
}

impl Clone for Member {
    fn clone(&self) -> Self {
        match self {
            Member::Method(method) => Member::Method(Arc::clone(method)),
            Member::Signal(signal) => Member::Signal(signal.clone()),
            Member::Property(property) => Member::Property(property.clone()),
        }
    }
}

impl Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Member::Method(_) => "Method",
            Member::Signal(_) => "Signal",
            Member::Property(_) => "Property",
        };
        f.write_str(kind)
    }
}

/// An ordered member map with an optional base prototype.
pub struct Prototype {
    members: IndexMap<String, Member>,
    base: Option<Arc<Prototype>>,
}

impl Prototype {
    pub(crate) fn new(base: Option<Arc<Prototype>>) -> Self {
        Self {
            members: IndexMap::new(),
            base,
        }
    }

    /// Define a method on this prototype, shadowing any base member of
    /// the same name.
    pub fn set_method<F>(&mut self, name: &str, method: F)
    where
        F: Fn(&Instance, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.members
            .insert(name.to_owned(), Member::Method(Arc::new(method)));
    }

    /// Define a signal member. Returns a handle to it.
    pub fn set_signal(&mut self, name: &str) -> Signal<Value> {
        let signal = Signal::new();
        self.members
            .insert(name.to_owned(), Member::Signal(signal.clone()));
        signal
    }

    /// Define a property member, optionally with a default value.
    /// Returns a handle to it.
    pub fn set_property(&mut self, name: &str, default: Option<Value>) -> Property<Value> {
        let property = match default {
            Some(value) => Property::with_default(value),
            None => Property::new(),
        };
        self.members
            .insert(name.to_owned(), Member::Property(property.clone()));
        property
    }

    /// Look up a member, walking the prototype chain.
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members
            .get(name)
            .or_else(|| self.base.as_ref().and_then(|base| base.member(name)))
    }

    /// Look up a method, walking the prototype chain.
    ///
    /// Returning the `Arc` lets a deriving prototype capture its base's
    /// implementation for explicit super-dispatch.
    pub fn method(&self, name: &str) -> Option<Method> {
        match self.member(name) {
            Some(Member::Method(method)) => Some(Arc::clone(method)),
            _ => None,
        }
    }

    /// The immediate base prototype, if any.
    pub fn base(&self) -> Option<&Prototype> {
        self.base.as_deref()
    }

    /// The number of members defined directly on this prototype.
    pub fn own_len(&self) -> usize {
        self.members.len()
    }
}

impl Debug for Prototype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prototype")
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("has_base", &self.base.is_some())
            .finish()
    }
}

/// An object sharing a prototype chain, with its own field map.
pub struct Instance {
    proto: Arc<Prototype>,
    fields: RwLock<IndexMap<String, Value>>,
}

impl Instance {
    pub(crate) fn new(proto: Arc<Prototype>) -> Self {
        Self {
            proto,
            fields: RwLock::new(IndexMap::new()),
        }
    }

    /// Invoke a method from the prototype chain.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, Error> {
        let method = self
            .proto
            .method(name)
            .ok_or_else(|| Error::UnknownMethod(name.to_owned()))?;
        Ok(method(self, args))
    }

    /// Look up a signal member from the prototype chain.
    pub fn signal(&self, name: &str) -> Result<Signal<Value>, Error> {
        match self.proto.member(name) {
            Some(Member::Signal(signal)) => Ok(signal.clone()),
            Some(_) => Err(Error::MemberKind(name.to_owned(), "signal")),
            None => Err(Error::UnknownMember(name.to_owned())),
        }
    }

    /// Look up a property member from the prototype chain.
    pub fn property(&self, name: &str) -> Result<Property<Value>, Error> {
        match self.proto.member(name) {
            Some(Member::Property(property)) => Ok(property.clone()),
            Some(_) => Err(Error::MemberKind(name.to_owned(), "property")),
            None => Err(Error::UnknownMember(name.to_owned())),
        }
    }

    /// Read an instance field.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields
            .read()
            .expect("fields lock poisoned")
            .get(name)
            .cloned()
    }

    /// Write an instance field.
    pub fn set(&self, name: &str, value: Value) {
        self.fields
            .write()
            .expect("fields lock poisoned")
            .insert(name.to_owned(), value);
    }

    /// Access the shared prototype.
    pub fn prototype(&self) -> &Prototype {
        &self.proto
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field(
                "fields",
                &self
                    .fields
                    .read()
                    .expect("fields lock poisoned")
                    .keys()
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn member_lookup_walks_the_chain() {
        let mut base = Prototype::new(None);
        base.set_method("greet", |_, _| json!("hello"));

        let mut derived = Prototype::new(Some(Arc::new(base)));
        derived.set_method("shout", |_, _| json!("HELLO"));

        assert!(derived.method("greet").is_some());
        assert!(derived.method("shout").is_some());
        assert!(derived.method("missing").is_none());
    }

    #[test]
    fn derived_members_shadow_base_members() {
        let mut base = Prototype::new(None);
        base.set_method("value", |_, _| json!(1));

        let mut derived = Prototype::new(Some(Arc::new(base)));
        derived.set_method("value", |_, _| json!(2));

        let instance = Instance::new(Arc::new(derived));
        assert_eq!(instance.invoke("value", &[]).unwrap(), json!(2));
    }

    #[test]
    fn instance_fields_are_per_instance() {
        let proto = Arc::new(Prototype::new(None));
        let first = Instance::new(proto.clone());
        let second = Instance::new(proto);

        first.set("name", json!("a"));
        assert_eq!(first.get("name"), Some(json!("a")));
        assert_eq!(second.get("name"), None);
    }

    #[test]
    fn wrong_member_kind_is_an_error() {
        let mut proto = Prototype::new(None);
        proto.set_signal("changed");

        let instance = Instance::new(Arc::new(proto));
        assert!(matches!(
            instance.property("changed"),
            Err(Error::MemberKind(_, _))
        ));
        assert!(instance.signal("changed").is_ok());
    }
}
