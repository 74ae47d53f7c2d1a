//! Type registry: decides how a raw value becomes a set-like one.
//!
//! Resolution order for a value of type `T`:
//!
//! 1. already set-like: an `AnySet`, or a value wrapped with
//!    [`RawSet::set_like`]
//! 2. cached resolution for `T`
//! 3. adapter registered for exactly `T`
//! 4. detectors, in registration order
//! 5. built-in containers (`Vec`, slices, `BTreeSet`, `HashSet`)
//! 6. types declared set-like with [`TypeRegistry::register_set_like`]
//! 7. iterable fallback (`VecDeque`, strings, [`RawSet::iterable`], …)
//!
//! Step 1 is never cached. Steps 3 to 7 cache the winning resolution by `TypeId`. Registering an
//! exact-type adapter evicts that type's cache entry; registering a
//! detector clears the whole cache, because it may now match types that
//! were resolved before.
//!
//! The process-wide registry returned by [`registry`] is guarded by
//! `RwLock`s and can be shared across threads.

use crate::any_set::AnySet;
use crate::builtin::{self, BuiltinKind};
use crate::raw::{self, RawSet, StructuralProbe};
use eule_kernel::{Capability, Element, SetLike};
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Builds a set from a raw value, or explains why it cannot.
pub type Factory = Arc<dyn Fn(&dyn Any) -> Result<AnySet, String> + Send + Sync>;

/// Decides whether a detector applies to a raw value.
pub type Predicate = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;

/// Why a value could not be adapted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdaptError {
    #[error(
        "{type_name} is not set-like; implement SetLike ({caps}) and wrap it with RawSet::set_like, \
         or register an adapter with register_type or register_detector",
        caps = Capability::required_list()
    )]
    Unadaptable { type_name: String },

    #[error("adapter for {type_name} failed: {reason}")]
    FactoryFailed { type_name: String, reason: String },
}

/// The strategy that produced an adapted set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", content = "detail", rename_all = "snake_case")]
pub enum AdaptStrategy {
    AlreadySetLike,
    Cached,
    ExactType,
    Detector(String),
    Builtin(BuiltinKind),
    Structural,
    IterableFallback,
}

impl fmt::Display for AdaptStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySetLike => f.write_str("already set-like"),
            Self::Cached => f.write_str("cached"),
            Self::ExactType => f.write_str("exact type"),
            Self::Detector(label) => write!(f, "detector {label}"),
            Self::Builtin(kind) => write!(f, "builtin {kind}"),
            Self::Structural => f.write_str("structural"),
            Self::IterableFallback => f.write_str("iterable fallback"),
        }
    }
}

/// An adapted set and how it was obtained.
#[derive(Debug, Clone)]
pub struct Adapted {
    pub set: AnySet,
    pub strategy: AdaptStrategy,
}

#[derive(Clone)]
struct Detector {
    label: String,
    predicate: Predicate,
    factory: Factory,
}

#[derive(Clone)]
struct Resolution {
    strategy: AdaptStrategy,
    factory: Factory,
}

/// Registry of adapters, detectors and cached resolutions.
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<TypeId, Factory>>,
    detectors: RwLock<Vec<Detector>>,
    structural: RwLock<HashMap<TypeId, StructuralProbe>>,
    cache: RwLock<HashMap<TypeId, Resolution>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.registered_types())
            .field("detectors", &self.detector_labels())
            .field("cached", &self.cached_types())
            .finish()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter for exactly the type `T`.
    ///
    /// Replaces any adapter previously registered for `T`.
    pub fn register_type<T, S, F>(&self, factory: F)
    where
        T: Any,
        S: SetLike<Item = Element> + fmt::Debug + Send + Sync + 'static,
        F: Fn(&T) -> S + Send + Sync + 'static,
    {
        self.register_fallible_type::<T, _>(move |value| Ok(AnySet::new(factory(value))));
    }

    /// Register an adapter for `T` that may fail; the failure reason is
    /// reported as [`AdaptError::FactoryFailed`].
    pub fn register_fallible_type<T, F>(&self, factory: F)
    where
        T: Any,
        F: Fn(&T) -> Result<AnySet, String> + Send + Sync + 'static,
    {
        let erased: Factory = Arc::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
            Some(typed) => factory(typed),
            None => Err(format!("expected {}", std::any::type_name::<T>())),
        });
        let type_id = TypeId::of::<T>();
        write(&self.types).insert(type_id, erased);
        write(&self.cache).remove(&type_id);
        tracing::debug!(type_name = std::any::type_name::<T>(), "registered type adapter");
    }

    /// Register a detector, tried in registration order after exact types.
    ///
    /// A detector with the same label is replaced in place, keeping its
    /// position.
    pub fn register_detector<P, F>(&self, label: impl Into<String>, predicate: P, factory: F)
    where
        P: Fn(&dyn Any) -> bool + Send + Sync + 'static,
        F: Fn(&dyn Any) -> Result<AnySet, String> + Send + Sync + 'static,
    {
        let detector = Detector {
            label: label.into(),
            predicate: Arc::new(predicate),
            factory: Arc::new(factory),
        };
        tracing::debug!(label = %detector.label, "registered detector");

        let mut detectors = write(&self.detectors);
        match detectors.iter_mut().find(|d| d.label == detector.label) {
            Some(existing) => *existing = detector,
            None => detectors.push(detector),
        }
        drop(detectors);
        self.clear_cache();
    }

    /// Declare that `S` implements [`SetLike`], so plain [`RawSet::new`]
    /// values of that type use their own algebra when no exact type,
    /// detector or builtin matches.
    pub fn register_set_like<S>(&self)
    where
        S: SetLike<Item = Element> + fmt::Debug + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<S>();
        write(&self.structural).insert(type_id, raw::probe::<S>);
        write(&self.cache).remove(&type_id);
        tracing::debug!(type_name = std::any::type_name::<S>(), "registered set-like type");
    }

    /// Adapt a raw value.
    pub fn adapt(&self, raw: &RawSet) -> Result<Adapted, AdaptError> {
        let value = raw.as_any();
        if let Some(set) = value.downcast_ref::<AnySet>() {
            return Ok(Adapted {
                set: set.clone(),
                strategy: AdaptStrategy::AlreadySetLike,
            });
        }
        if let Some(set) = raw.structural_probe().and_then(|probe| probe(value)) {
            return Ok(Adapted {
                set,
                strategy: AdaptStrategy::AlreadySetLike,
            });
        }

        let type_id = raw.value_type_id();
        let cached = read(&self.cache).get(&type_id).cloned();
        if let Some(resolution) = cached {
            tracing::trace!(type_name = raw.type_name(), "cached resolution");
            return apply(&resolution.factory, raw, AdaptStrategy::Cached);
        }

        let resolution = self.resolve(raw).ok_or_else(|| AdaptError::Unadaptable {
            type_name: raw.type_name().to_string(),
        })?;
        tracing::debug!(type_name = raw.type_name(), strategy = %resolution.strategy, "resolved adapter");
        write(&self.cache).insert(type_id, resolution.clone());
        apply(&resolution.factory, raw, resolution.strategy)
    }

    fn resolve(&self, raw: &RawSet) -> Option<Resolution> {
        let type_id = raw.value_type_id();
        let value = raw.as_any();

        if let Some(factory) = read(&self.types).get(&type_id) {
            return Some(Resolution {
                strategy: AdaptStrategy::ExactType,
                factory: factory.clone(),
            });
        }

        for detector in read(&self.detectors).iter() {
            if (detector.predicate)(value) {
                return Some(Resolution {
                    strategy: AdaptStrategy::Detector(detector.label.clone()),
                    factory: detector.factory.clone(),
                });
            }
        }

        let entry = builtin::lookup(type_id);
        if let Some(entry) = entry.filter(|e| e.kind != BuiltinKind::Iterable) {
            return Some(Resolution {
                strategy: AdaptStrategy::Builtin(entry.kind),
                factory: builtin_factory(entry.kind, type_id),
            });
        }

        let probe = read(&self.structural).get(&type_id).copied();
        if let Some(probe) = probe {
            let factory: Factory = Arc::new(move |value: &dyn Any| {
                probe(value).ok_or_else(|| "value no longer matches its set-like type".to_string())
            });
            return Some(Resolution {
                strategy: AdaptStrategy::Structural,
                factory,
            });
        }

        entry.map(|entry| Resolution {
            strategy: AdaptStrategy::IterableFallback,
            factory: builtin_factory(entry.kind, type_id),
        })
    }

    /// Forget every cached resolution.
    pub fn clear_cache(&self) {
        write(&self.cache).clear();
    }

    /// Remove all registrations and cached resolutions.
    pub fn reset(&self) {
        write(&self.types).clear();
        write(&self.detectors).clear();
        write(&self.structural).clear();
        self.clear_cache();
    }

    pub fn cached_types(&self) -> usize {
        read(&self.cache).len()
    }

    pub fn registered_types(&self) -> usize {
        read(&self.types).len()
    }

    pub fn detector_labels(&self) -> Vec<String> {
        read(&self.detectors).iter().map(|d| d.label.clone()).collect()
    }
}

fn builtin_factory(kind: BuiltinKind, type_id: TypeId) -> Factory {
    Arc::new(move |value: &dyn Any| {
        builtin::lookup(type_id)
            .and_then(|entry| entry.adapt(value))
            .ok_or_else(|| format!("value is not a {kind} container"))
    })
}

fn apply(factory: &Factory, raw: &RawSet, strategy: AdaptStrategy) -> Result<Adapted, AdaptError> {
    factory(raw.as_any())
        .map(|set| Adapted { set, strategy })
        .map_err(|reason| AdaptError::FactoryFailed {
            type_name: raw.type_name().to_string(),
            reason,
        })
}

// A panicking adapter must not disable the registry for every later caller.
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

static REGISTRY: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::new);

/// The process-wide registry used by the top-level operations.
pub fn registry() -> &'static TypeRegistry {
    &REGISTRY
}

/// Register an exact-type adapter in the process-wide registry.
pub fn register_type<T, S, F>(factory: F)
where
    T: Any,
    S: SetLike<Item = Element> + fmt::Debug + Send + Sync + 'static,
    F: Fn(&T) -> S + Send + Sync + 'static,
{
    registry().register_type::<T, S, F>(factory);
}

/// Declare a set-like type in the process-wide registry.
pub fn register_set_like<S>()
where
    S: SetLike<Item = Element> + fmt::Debug + Send + Sync + 'static,
{
    registry().register_set_like::<S>();
}

/// Register a detector in the process-wide registry.
pub fn register_detector<P, F>(label: impl Into<String>, predicate: P, factory: F)
where
    P: Fn(&dyn Any) -> bool + Send + Sync + 'static,
    F: Fn(&dyn Any) -> Result<AnySet, String> + Send + Sync + 'static,
{
    registry().register_detector(label, predicate, factory);
}
