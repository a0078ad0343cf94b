//! Type handlers: per-kind read/write against a [`Settings`] backend.
//!
//! The registry is keyed by [`PreferenceKind`], so dispatch is a map lookup
//! on a closed type tag instead of a runtime type test.

use std::collections::HashMap;
use std::sync::Arc;

use prefkit_core::{PreferenceKind, PreferenceValue, PrefsResult, ValidationError};

use crate::settings::Settings;

/// Reads and writes one kind of value.
pub trait TypeHandler: Send + Sync {
    /// The kind this handler is responsible for.
    fn kind(&self) -> PreferenceKind;

    /// Read `key` as this handler's kind.
    fn get(&self, settings: &dyn Settings, key: &str) -> PrefsResult<Option<PreferenceValue>>;

    /// Write `value` under `key`. The value must be of this handler's kind.
    fn put(&self, settings: &dyn Settings, key: &str, value: &PreferenceValue) -> PrefsResult<()>;
}

macro_rules! primitive_handler {
    ($name:ident, $variant:ident, $get:ident, $put:ident) => {
        #[doc = concat!("Handler for [`PreferenceKind::", stringify!($variant), "`].")]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl TypeHandler for $name {
            fn kind(&self) -> PreferenceKind {
                PreferenceKind::$variant
            }

            fn get(
                &self,
                settings: &dyn Settings,
                key: &str,
            ) -> PrefsResult<Option<PreferenceValue>> {
                Ok(settings.$get(key)?.map(PreferenceValue::$variant))
            }

            fn put(
                &self,
                settings: &dyn Settings,
                key: &str,
                value: &PreferenceValue,
            ) -> PrefsResult<()> {
                match value {
                    PreferenceValue::$variant(v) => settings.$put(key, *v),
                    other => Err(ValidationError::UnsupportedType { kind: other.kind() }.into()),
                }
            }
        }
    };
}

primitive_handler!(IntHandler, Int, get_int, put_int);
primitive_handler!(LongHandler, Long, get_long, put_long);
primitive_handler!(FloatHandler, Float, get_float, put_float);
primitive_handler!(DoubleHandler, Double, get_double, put_double);
primitive_handler!(BoolHandler, Bool, get_bool, put_bool);

/// Handler for [`PreferenceKind::String`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StringHandler;

impl TypeHandler for StringHandler {
    fn kind(&self) -> PreferenceKind {
        PreferenceKind::String
    }

    fn get(&self, settings: &dyn Settings, key: &str) -> PrefsResult<Option<PreferenceValue>> {
        Ok(settings.get_string(key)?.map(PreferenceValue::String))
    }

    fn put(&self, settings: &dyn Settings, key: &str, value: &PreferenceValue) -> PrefsResult<()> {
        match value {
            PreferenceValue::String(v) => settings.put_string(key, v),
            other => Err(ValidationError::UnsupportedType { kind: other.kind() }.into()),
        }
    }
}

/// Registry of type handlers keyed by kind.
#[derive(Clone)]
pub struct TypeRegistry {
    handlers: HashMap<PreferenceKind, Arc<dyn TypeHandler>>,
}

impl TypeRegistry {
    /// An empty registry. Every lookup fails until handlers are registered.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with handlers for all six primitive kinds.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(IntHandler);
        registry.register(LongHandler);
        registry.register(FloatHandler);
        registry.register(DoubleHandler);
        registry.register(StringHandler);
        registry.register(BoolHandler);
        registry
    }

    /// Register a handler, replacing any existing handler for its kind.
    pub fn register<H: TypeHandler + 'static>(&mut self, handler: H) -> &mut Self {
        self.handlers.insert(handler.kind(), Arc::new(handler));
        self
    }

    pub fn supports(&self, kind: PreferenceKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Look up the handler for a kind.
    pub fn handler(&self, kind: PreferenceKind) -> PrefsResult<&dyn TypeHandler> {
        self.handlers
            .get(&kind)
            .map(|h| &**h)
            .ok_or_else(|| ValidationError::UnsupportedType { kind }.into())
    }

    /// Read `key` through the handler for `kind`.
    pub fn read(
        &self,
        settings: &dyn Settings,
        key: &str,
        kind: PreferenceKind,
    ) -> PrefsResult<Option<PreferenceValue>> {
        self.handler(kind)?.get(settings, key)
    }

    /// Write `value` through the handler for its kind.
    pub fn write(
        &self,
        settings: &dyn Settings,
        key: &str,
        value: &PreferenceValue,
    ) -> PrefsResult<()> {
        self.handler(value.kind())?.put(settings, key, value)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort();
        f.debug_struct("TypeRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySettings;
    use prefkit_core::PrefsError;

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = TypeRegistry::with_defaults();
        for kind in PreferenceKind::ALL {
            assert!(registry.supports(kind), "missing handler for {kind}");
            assert_eq!(registry.handler(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_write_then_read_through_registry() {
        let registry = TypeRegistry::with_defaults();
        let settings = MemorySettings::new();

        registry
            .write(&settings, "count", &PreferenceValue::Long(9))
            .unwrap();
        let value = registry
            .read(&settings, "count", PreferenceKind::Long)
            .unwrap();
        assert_eq!(value, Some(PreferenceValue::Long(9)));
    }

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = TypeRegistry::empty();
        let settings = MemorySettings::new();
        let err = registry
            .write(&settings, "k", &PreferenceValue::Bool(true))
            .unwrap_err();
        assert!(matches!(
            err,
            PrefsError::Validation(ValidationError::UnsupportedType {
                kind: PreferenceKind::Bool
            })
        ));
        assert!(settings.keys().unwrap().is_empty());
    }

    #[test]
    fn test_handler_rejects_foreign_value() {
        let settings = MemorySettings::new();
        let err = IntHandler
            .put(&settings, "k", &PreferenceValue::String("1".into()))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_register_replaces_handler() {
        struct ClampedInt;

        impl TypeHandler for ClampedInt {
            fn kind(&self) -> PreferenceKind {
                PreferenceKind::Int
            }

            fn get(
                &self,
                settings: &dyn Settings,
                key: &str,
            ) -> PrefsResult<Option<PreferenceValue>> {
                IntHandler.get(settings, key)
            }

            fn put(
                &self,
                settings: &dyn Settings,
                key: &str,
                value: &PreferenceValue,
            ) -> PrefsResult<()> {
                match value {
                    PreferenceValue::Int(v) => settings.put_int(key, (*v).clamp(0, 100)),
                    other => IntHandler.put(settings, key, other),
                }
            }
        }

        let mut registry = TypeRegistry::with_defaults();
        registry.register(ClampedInt);
        let settings = MemorySettings::new();
        registry
            .write(&settings, "volume", &PreferenceValue::Int(250))
            .unwrap();
        assert_eq!(settings.get_int("volume").unwrap(), Some(100));
    }
}
