//! The per-format strategy cache.
//!
//! A [`StrategyCache`] maps a [`TypeDescriptor`] to the [`Strategy`] that
//! writes and reads values of that type. Entries are built on first use by
//! the resolver and then served from an immutable snapshot:
//!
//! - lookups load the current snapshot without locking
//! - a miss builds the entry, copies the snapshot, inserts, and publishes the
//!   copy with a compare-and-swap; a lost race retries against the newer
//!   snapshot and keeps the entry that was published first
//! - [`StrategyCache::reset`] swaps in an empty snapshot
//!
//! Strategies depend only on a type's shape. Options are consulted at call
//! time, so one cache serves every configuration.
//!
//! ## Examples
//!
//! ```rust
//! use jsv_text::{jsv, TypeDescriptor};
//!
//! jsv::to_string(&vec![1u16, 2, 3]).unwrap();
//! assert!(jsv::cache().contains(TypeDescriptor::of::<Vec<u16>>()));
//! assert!(jsv::cache().contains(TypeDescriptor::of::<u16>()));
//! ```

use crate::composite::CompositePlan;
use crate::de::Reader;
use crate::format::Format;
use crate::reflect::{AnyBox, Reflect, Shape, TypeDescriptor};
use crate::ser::Writer;
use crate::{Error, Result};
use arc_swap::ArcSwap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type WriteFn = Arc<dyn Fn(&mut Writer<'_>, &dyn Reflect) -> Result<()> + Send + Sync>;
pub type ReadFn = Arc<dyn Fn(&mut Reader<'_>, &str) -> Result<AnyBox> + Send + Sync>;

/// The cached write/read pair for one type.
pub struct Strategy {
    pub(crate) descriptor: TypeDescriptor,
    pub(crate) shape: Shape,
    pub(crate) write: WriteFn,
    pub(crate) read: ReadFn,
    pub(crate) plan: Option<Arc<CompositePlan>>,
    /// Built from a registered custom codec.
    pub(crate) custom: bool,
}

impl Strategy {
    #[must_use]
    pub fn descriptor(&self) -> TypeDescriptor {
        self.descriptor
    }

    /// Family label of the resolved shape.
    #[must_use]
    pub fn family(&self) -> &'static str {
        self.shape.family()
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.plan.is_some()
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("type", &self.descriptor)
            .field("family", &self.shape.family())
            .finish()
    }
}

type CustomWrite = Arc<dyn Fn(&dyn Any) -> Option<String> + Send + Sync>;
type CustomParse = Arc<dyn Fn(&str) -> Result<AnyBox> + Send + Sync>;

/// User-supplied text codec that replaces the resolved strategy of a type.
#[derive(Clone)]
pub(crate) struct CustomCodec {
    pub(crate) write: CustomWrite,
    pub(crate) parse: CustomParse,
}

type Entries = HashMap<TypeId, Arc<Strategy>>;

/// Concurrent, append-only map from type to strategy for one format.
pub struct StrategyCache {
    format: Format,
    entries: ArcSwap<Entries>,
    customs: ArcSwap<HashMap<TypeId, CustomCodec>>,
}

impl StrategyCache {
    #[must_use]
    pub fn new(format: Format) -> Self {
        StrategyCache {
            format,
            entries: ArcSwap::from_pointee(HashMap::new()),
            customs: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Number of published strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// Whether a strategy for `descriptor` has been published.
    #[must_use]
    pub fn contains(&self, descriptor: TypeDescriptor) -> bool {
        self.entries.load().contains_key(&descriptor.id())
    }

    /// Returns the strategy for `descriptor`, building and publishing it on a miss.
    pub fn get_or_build(&self, descriptor: TypeDescriptor) -> Arc<Strategy> {
        if let Some(found) = self.entries.load().get(&descriptor.id()) {
            return Arc::clone(found);
        }
        let mut built = Arc::new(crate::resolve::resolve(self, descriptor));
        loop {
            let current = self.entries.load_full();
            if let Some(existing) = current.get(&descriptor.id()) {
                return Arc::clone(existing);
            }
            // a codec registered since the build makes it stale
            if built.custom != self.customs.load().contains_key(&descriptor.id()) {
                tracing::trace!(
                    type_name = descriptor.name(),
                    "custom codec changed during build, rebuilding"
                );
                built = Arc::new(crate::resolve::resolve(self, descriptor));
                continue;
            }
            let mut next = Entries::clone(&current);
            next.insert(descriptor.id(), Arc::clone(&built));
            let previous = self.entries.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                tracing::debug!(
                    format = self.format.as_str(),
                    type_name = descriptor.name(),
                    family = built.family(),
                    "strategy published"
                );
                return built;
            }
            tracing::trace!(
                type_name = descriptor.name(),
                "strategy snapshot changed during publish, retrying"
            );
        }
    }

    /// Drops every published strategy; they are rebuilt on next use.
    pub fn reset(&self) {
        let dropped = self.entries.swap(Arc::new(HashMap::new())).len();
        tracing::debug!(format = self.format.as_str(), dropped, "strategy cache reset");
    }

    /// Installs a text codec for `T`, replacing its resolved strategy.
    ///
    /// The produced text is written as a string token of the format. The
    /// cache is reset so strategies resolved before the registration are
    /// rebuilt; a build racing with the registration is redone before it
    /// is published.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsv_text::{json, Error, Reflect, Shape};
    ///
    /// #[derive(Default, Debug, PartialEq)]
    /// struct Celsius(f64);
    ///
    /// impl Reflect for Celsius {
    ///     fn shape() -> Shape {
    ///         Shape::opaque::<Celsius>()
    ///     }
    /// }
    ///
    /// json::cache().register_custom::<Celsius>(
    ///     |c| format!("{}C", c.0),
    ///     |text| {
    ///         let degrees = text.trim_end_matches('C');
    ///         degrees.parse().map(Celsius).map_err(Error::custom)
    ///     },
    /// );
    /// assert_eq!(json::to_string(&Celsius(21.5)).unwrap(), "\"21.5C\"");
    /// assert_eq!(json::from_str::<Celsius>("\"21.5C\"").unwrap(), Celsius(21.5));
    /// ```
    pub fn register_custom<T: Reflect>(
        &self,
        write: impl Fn(&T) -> String + Send + Sync + 'static,
        parse: impl Fn(&str) -> Result<T> + Send + Sync + 'static,
    ) {
        let codec = CustomCodec {
            write: Arc::new(move |any: &dyn Any| any.downcast_ref::<T>().map(&write)),
            parse: Arc::new(move |text: &str| parse(text).map(|v| Box::new(v) as AnyBox)),
        };
        self.customs.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(TypeId::of::<T>(), codec.clone());
            next
        });
        tracing::debug!(
            format = self.format.as_str(),
            type_name = T::type_name(),
            "custom codec registered"
        );
        self.reset();
    }

    pub(crate) fn custom(&self, id: TypeId) -> Option<CustomCodec> {
        self.customs.load().get(&id).cloned()
    }
}

impl fmt::Debug for StrategyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyCache")
            .field("format", &self.format)
            .field("entries", &self.len())
            .finish()
    }
}

pub(crate) fn custom_type_mismatch(descriptor: TypeDescriptor) -> Error {
    Error::type_mismatch(descriptor.name(), "a value of another type")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_get_or_build_publishes_once() {
        let cache = StrategyCache::new(Format::Jsv);
        assert!(cache.is_empty());
        let first = cache.get_or_build(TypeDescriptor::of::<Vec<i64>>());
        let second = cache.get_or_build(TypeDescriptor::of::<Vec<i64>>());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.family(), "sequence");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reset_drops_entries() {
        let cache = StrategyCache::new(Format::Json);
        cache.get_or_build(TypeDescriptor::of::<String>());
        assert!(cache.contains(TypeDescriptor::of::<String>()));
        cache.reset();
        assert!(!cache.contains(TypeDescriptor::of::<String>()));
        assert!(cache.is_empty());
    }

    #[derive(Default, Debug, PartialEq)]
    struct Celsius(f64);

    impl Reflect for Celsius {
        fn shape() -> Shape {
            Shape::opaque::<Celsius>()
        }
    }

    #[test]
    fn test_registration_wins_over_concurrent_builds() {
        let cache = Arc::new(StrategyCache::new(Format::Jsv));
        let barrier = Arc::new(Barrier::new(5));
        let builders: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..200 {
                        cache.get_or_build(TypeDescriptor::of::<Celsius>());
                    }
                })
            })
            .collect();
        barrier.wait();
        cache.register_custom::<Celsius>(
            |c| format!("{}C", c.0),
            |text| {
                text.trim_end_matches('C')
                    .parse()
                    .map(Celsius)
                    .map_err(Error::custom)
            },
        );
        for builder in builders {
            builder.join().unwrap();
        }
        assert!(cache.get_or_build(TypeDescriptor::of::<Celsius>()).custom);
    }

    #[test]
    fn test_concurrent_first_use_converges() {
        let cache = Arc::new(StrategyCache::new(Format::Jsv));
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let shared = cache.get_or_build(TypeDescriptor::of::<Vec<u8>>());
                    if i % 2 == 0 {
                        cache.get_or_build(TypeDescriptor::of::<Option<u32>>());
                    } else {
                        cache.get_or_build(TypeDescriptor::of::<bool>());
                    }
                    shared
                })
            })
            .collect();
        let strategies: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for strategy in &strategies {
            assert!(Arc::ptr_eq(strategy, &strategies[0]));
        }
        assert_eq!(cache.len(), 3);
    }
}
