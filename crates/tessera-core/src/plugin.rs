//! Name-based plugin lookup.
//!
//! A [`PluginRegistry`] maps a type name to a constructor closure. Asking for
//! a name produces a fresh boxed instance of the capability trait, which is
//! how the index factory turns `"RangeIndex"` into a `Box<dyn Index>` and the
//! engine turns `"BidirectionalLevelSynchronousBfs"` into a path algorithm.
//!
//! Registration is allowed at any time and is safe to do concurrently with
//! lookups.

use std::sync::Arc;

use tessera_common::collections::{TesseraConcurrentMap, tessera_concurrent_map};

type Constructor<T> = Arc<dyn Fn() -> Box<T> + Send + Sync>;

/// A registry of constructors for one capability trait `T`.
///
/// ```
/// use tessera_core::plugin::PluginRegistry;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let registry: PluginRegistry<dyn Greeter> = PluginRegistry::new();
/// registry.register("English", || Box::new(English));
///
/// assert_eq!(registry.try_find_plugin("English").unwrap().greet(), "hello");
/// assert!(registry.try_find_plugin("French").is_none());
/// ```
pub struct PluginRegistry<T: ?Sized + 'static> {
    constructors: TesseraConcurrentMap<String, Constructor<T>>,
}

impl<T: ?Sized + 'static> PluginRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: tessera_concurrent_map(),
        }
    }

    /// Registers (or replaces) the constructor for `name`.
    pub fn register<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<T> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .constructors
            .insert(name.clone(), Arc::new(constructor))
            .is_some()
        {
            tracing::debug!(plugin = %name, "replaced plugin constructor");
        }
    }

    /// Removes the constructor for `name`.
    pub fn unregister(&self, name: &str) -> bool {
        self.constructors.remove(name).is_some()
    }

    /// Builds a fresh instance of the plugin registered as `name`.
    #[must_use]
    pub fn try_find_plugin(&self, name: &str) -> Option<Box<T>> {
        // Clone the constructor out so the shard lock is not held while it runs.
        let constructor = self.constructors.get(name).map(|c| Arc::clone(c.value()))?;
        Some(constructor())
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }
}

impl<T: ?Sized + 'static> Default for PluginRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> std::fmt::Debug for PluginRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("names", &self.names())
            .finish()
    }
}
