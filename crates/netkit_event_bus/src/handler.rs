//! Typed subscriber handles.

use crate::error::EventError;
use std::fmt;
use std::sync::Arc;

type Callback<T> = dyn Fn(&T) -> Result<(), EventError> + Send + Sync;

/// Stable identity of a handler registration, derived from its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HandlerId(usize);

/// A subscriber callback for messages of type `T`.
///
/// Identity is the underlying allocation: clones of a `Handler` are the same
/// subscriber, two handlers built from identical closures are not. Keep the
/// handle around to unsubscribe later.
pub struct Handler<T: 'static> {
    callback: Arc<Callback<T>>,
    name: Arc<str>,
}

impl<T: 'static> Handler<T> {
    /// Wraps a callback, naming it after the closure type for log output.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        Self::named(std::any::type_name::<F>(), callback)
    }

    /// Wraps a callback with an explicit name used in log output.
    pub fn named<F>(name: impl AsRef<str>, callback: F) -> Self
    where
        F: Fn(&T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            name: Arc::from(name.as_ref()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if both handles refer to the same subscriber.
    pub fn same_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    pub(crate) fn id(&self) -> HandlerId {
        HandlerId(Arc::as_ptr(&self.callback) as *const () as usize)
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }

    pub(crate) fn call(&self, message: &T) -> Result<(), EventError> {
        (self.callback)(message)
    }
}

impl<T: 'static> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("message", &std::any::type_name::<T>())
            .finish()
    }
}
