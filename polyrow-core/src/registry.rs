//! Method registry
//!
//! Maps method names to the descriptors of their parameters and result.
//! The registry is filled once during start-up and then frozen; the codec
//! consults it for every message. Registering a method also resolves every
//! Either tree reachable from its descriptors, so decoding never pays for a
//! tree walk and an over-deep Either is rejected at registration time.
//!
//! # Examples
//!
//! ```rust
//! use polyrow_core::{MethodRegistry, TypeDescriptor};
//!
//! let registry = MethodRegistry::builder()
//!     .request("shutdown", vec![], TypeDescriptor::null())
//!     .notification("exit", vec![])
//!     .build()
//!     .unwrap();
//!
//! assert!(registry.is_frozen());
//! assert!(registry.lookup("exit").unwrap().is_notification());
//! ```

use crate::codec::CodecConfig;
use crate::descriptor::TypeDescriptor;
use crate::either::EitherResolver;
use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::types::MessageKind;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Signature of one protocol method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRegistration {
    name: String,
    params: Vec<TypeDescriptor>,
    result: Option<TypeDescriptor>,
    notification: bool,
}

impl MethodRegistration {
    /// A request answered with a `result` of type `result`
    pub fn request(
        name: impl Into<String>,
        params: Vec<TypeDescriptor>,
        result: impl Into<TypeDescriptor>,
    ) -> Self {
        Self::new(name, params, Some(result.into()), false)
    }

    /// A notification, which has no result
    pub fn notification(name: impl Into<String>, params: Vec<TypeDescriptor>) -> Self {
        Self::new(name, params, None, true)
    }

    pub fn new(
        name: impl Into<String>,
        params: Vec<TypeDescriptor>,
        result: Option<TypeDescriptor>,
        notification: bool,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            result,
            notification,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter descriptors in positional order
    pub fn params(&self) -> &[TypeDescriptor] {
        &self.params
    }

    pub fn result(&self) -> Option<&TypeDescriptor> {
        self.result.as_ref()
    }

    pub fn is_notification(&self) -> bool {
        self.notification
    }

    /// Envelope kind every call to this method must use
    pub fn kind(&self) -> MessageKind {
        if self.notification {
            MessageKind::Notification
        } else {
            MessageKind::Request
        }
    }

    fn descriptors(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.params.iter().chain(self.result.iter())
    }
}

/// Registered methods, keyed by name
#[derive(Debug)]
pub struct MethodRegistry {
    methods: RwLock<HashMap<String, Arc<MethodRegistration>>>,
    resolver: Arc<EitherResolver>,
    frozen: AtomicBool,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            methods: RwLock::new(HashMap::new()),
            resolver: Arc::new(EitherResolver::with_depth_limit(config.either_depth_limit)),
            frozen: AtomicBool::new(false),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Add a method
    ///
    /// Registering the same signature twice is a no-op.
    ///
    /// # Errors
    ///
    /// - `RegistryFrozen` after [`freeze`](Self::freeze)
    /// - `DuplicateMethod` if the name is taken by a different signature
    /// - `UnboundedEitherDepth` if a descriptor nests Eithers too deeply
    pub fn register(&self, registration: MethodRegistration) -> Result<()> {
        if self.is_frozen() {
            return Err(Error::RegistryFrozen(registration.name));
        }

        if let Some(existing) = self.methods.read().get(&registration.name) {
            if **existing == registration {
                return Ok(());
            }
            return Err(Error::DuplicateMethod(registration.name));
        }

        let mut roots = 0;
        for descriptor in registration.descriptors() {
            roots += self.resolver.preload(descriptor)?;
        }
        debug!(
            method = %registration.name,
            params = registration.params.len(),
            either_roots = roots,
            "Registered method"
        );

        let mut methods = self.methods.write();
        if let Some(existing) = methods.get(&registration.name) {
            if **existing != registration {
                return Err(Error::DuplicateMethod(registration.name));
            }
            return Ok(());
        }
        methods.insert(registration.name.clone(), Arc::new(registration));
        Ok(())
    }

    /// Stop accepting registrations
    pub fn freeze(&self) {
        if !self.frozen.swap(true, Ordering::AcqRel) {
            debug!(
                methods = self.len(),
                either_roots = self.resolver.cached_len(),
                "Method registry frozen"
            );
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<MethodRegistration>> {
        self.methods.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.read().is_empty()
    }

    /// Resolver holding the Either paths of every registered descriptor
    pub fn resolver(&self) -> &Arc<EitherResolver> {
        &self.resolver
    }

    /// Matcher sharing this registry's resolver
    pub fn matcher(&self) -> Matcher {
        Matcher::new(Arc::clone(&self.resolver))
    }
}

/// Fluent construction of a frozen registry
///
/// The first failing registration is kept and reported by `build`.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    config: CodecConfig,
    registrations: Vec<MethodRegistration>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn method(mut self, registration: MethodRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    pub fn request(
        self,
        name: impl Into<String>,
        params: Vec<TypeDescriptor>,
        result: impl Into<TypeDescriptor>,
    ) -> Self {
        self.method(MethodRegistration::request(name, params, result))
    }

    pub fn notification(self, name: impl Into<String>, params: Vec<TypeDescriptor>) -> Self {
        self.method(MethodRegistration::notification(name, params))
    }

    /// Register everything and freeze
    pub fn build(self) -> Result<Arc<MethodRegistry>> {
        let registry = MethodRegistry::with_config(&self.config);
        for registration in self.registrations {
            registry.register(registration)?;
        }
        registry.freeze();
        Ok(Arc::new(registry))
    }
}
