// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The type registry.
//!
//! [`SerializationContext`] maps application types to stable wire type ids
//! and to one of three serialization strategies. Reconstruction hooks are
//! captured at registration time as monomorphized function pointers, so the
//! engines dispatch over `dyn Reflect` without any runtime introspection.
//!
//! A context is not safe for concurrent mutation. Finish registering before
//! sharing it; concurrent serialize/deserialize calls against a
//! no-longer-mutated context are safe.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use log::debug;

use crate::error::Error;
use crate::reflect::{Parts, Reconstruct, Reflect, TypeKey};
use crate::value::Value;

/// Captured reconstructor for a registered type: rebuilds an instance from
/// reflected parts via the type's `from_parts` constructor.
pub type ReconstructFn = fn(Parts) -> Result<Box<dyn Reflect>, Error>;

type CustomEncodeFn = Arc<dyn Fn(&dyn Reflect) -> Result<Value, Error> + Send + Sync>;
type CustomDecodeFn = Arc<dyn Fn(Value) -> Result<Box<dyn Reflect>, Error> + Send + Sync>;

/// The serialization strategy bound to a registered type. Each registered
/// type maps to exactly one strategy at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    OpaqueBlob,
    CustomCodec,
    GenericReflection,
}

/// Registry entry: application type identity, wire type id, and strategy.
#[derive(Clone, Debug)]
pub struct TypeEntry {
    type_key: TypeKey,
    type_id: String,
    strategy: Strategy,
}

impl TypeEntry {
    #[inline(always)]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    #[inline(always)]
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    #[inline(always)]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

/// User-supplied codec pair for the custom strategy. The closures are shared
/// by reference across context clones and must be side-effect free.
#[derive(Clone)]
pub struct CustomCodec {
    encode: CustomEncodeFn,
    decode: CustomDecodeFn,
}

impl CustomCodec {
    pub(crate) fn encode(&self, obj: &dyn Reflect) -> Result<Value, Error> {
        (self.encode)(obj)
    }

    pub(crate) fn decode(&self, value: Value) -> Result<Box<dyn Reflect>, Error> {
        (self.decode)(value)
    }
}

/// Pluggable byte-stream transform applied to opaque-blob segments.
///
/// The engine encodes an opaque object into self-contained bytes first; the
/// blob codec then transforms those bytes both ways. The default is a
/// passthrough.
pub trait BlobCodec: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, Error>;
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Default blob transform: the identity.
pub struct PassthroughCodec;

impl BlobCodec for PassthroughCodec {
    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(bytes.to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(bytes.to_vec())
    }
}

/// Resolution of a non-opaque wire type id at deserialize time.
pub(crate) enum Resolution<'a> {
    Custom(&'a CustomCodec),
    Reflection(ReconstructFn),
}

/// The type registry used identically by both engines.
///
/// Cloning yields an independent registry: all mappings are deep-copied,
/// codec handles are shared by reference.
#[derive(Clone)]
pub struct SerializationContext {
    entries: HashMap<TypeId, TypeEntry>,
    ids: HashMap<String, TypeKey>,
    reverse: HashMap<String, ReconstructFn>,
    opaque: HashMap<String, ReconstructFn>,
    codecs: HashMap<String, CustomCodec>,
    blob_codec: Arc<dyn BlobCodec>,
}

impl Default for SerializationContext {
    fn default() -> Self {
        SerializationContext {
            entries: HashMap::new(),
            ids: HashMap::new(),
            reverse: HashMap::new(),
            opaque: HashMap::new(),
            codecs: HashMap::new(),
            blob_codec: Arc::new(PassthroughCodec),
        }
    }
}

fn reconstruct_erased<T: Reconstruct>(parts: Parts) -> Result<Box<dyn Reflect>, Error> {
    Ok(Box::new(T::from_parts(parts)?))
}

impl SerializationContext {
    pub fn new() -> SerializationContext {
        SerializationContext::default()
    }

    /// Registers `T` under `type_id` with the generic-reflection strategy.
    ///
    /// Registering the identical (type, id, strategy) binding again is
    /// idempotent. Binding `type_id` to a different type, or `T` to a
    /// different id or strategy, fails with [`Error::Configuration`].
    pub fn register<T: Reconstruct>(&mut self, type_id: &str) -> Result<(), Error> {
        self.bind::<T>(type_id, Strategy::GenericReflection)?;
        self.reverse
            .insert(type_id.to_owned(), reconstruct_erased::<T>);
        Ok(())
    }

    /// Registers `T` under `type_id` with the opaque-blob strategy: instances
    /// travel as a single blob segment encoded through the context's blob
    /// codec, and the registry's reverse mapping is never consulted when
    /// reading them back.
    pub fn register_opaque<T: Reconstruct>(&mut self, type_id: &str) -> Result<(), Error> {
        self.bind::<T>(type_id, Strategy::OpaqueBlob)?;
        self.opaque
            .insert(type_id.to_owned(), reconstruct_erased::<T>);
        Ok(())
    }

    /// Registers `T` under `type_id` with a custom codec pair. The codec
    /// always takes precedence over generic reflection for this type.
    ///
    /// Re-registering the same (type, id) pair replaces the codec pair.
    pub fn register_codec<T, E, D>(
        &mut self,
        type_id: &str,
        encode: E,
        decode: D,
    ) -> Result<(), Error>
    where
        T: Reflect,
        E: Fn(&T) -> Result<Value, Error> + Send + Sync + 'static,
        D: Fn(Value) -> Result<T, Error> + Send + Sync + 'static,
    {
        self.bind::<T>(type_id, Strategy::CustomCodec)?;
        let encode: CustomEncodeFn = Arc::new(move |obj: &dyn Reflect| {
            let concrete = obj.as_any().downcast_ref::<T>().ok_or_else(|| {
                Error::type_mismatch(format!(
                    "object of type `{}` dispatched to codec registered for `{}`; \
                     register the concrete type or widen the codec",
                    obj.type_key().name(),
                    std::any::type_name::<T>()
                ))
            })?;
            encode(concrete)
        });
        let decode: CustomDecodeFn =
            Arc::new(move |value: Value| Ok(Box::new(decode(value)?) as Box<dyn Reflect>));
        self.codecs
            .insert(type_id.to_owned(), CustomCodec { encode, decode });
        Ok(())
    }

    /// Replaces the opaque-blob fallback transform.
    pub fn set_blob_codec<C: BlobCodec + 'static>(&mut self, codec: C) {
        self.blob_codec = Arc::new(codec);
    }

    fn bind<T: Reflect>(&mut self, type_id: &str, strategy: Strategy) -> Result<(), Error> {
        let key = TypeKey::of::<T>();
        if let Some(existing) = self.entries.get(&key.type_id()) {
            if existing.type_id != type_id || existing.strategy != strategy {
                return Err(Error::configuration(format!(
                    "type `{}` is already registered as `{}` ({:?}); \
                     re-registration must not change its id or strategy",
                    key.name(),
                    existing.type_id,
                    existing.strategy
                )));
            }
        }
        if let Some(owner) = self.ids.get(type_id) {
            if *owner != key {
                return Err(Error::configuration(format!(
                    "type id `{}` is already bound to `{}` and cannot alias `{}`",
                    type_id,
                    owner.name(),
                    key.name()
                )));
            }
        }
        debug!(
            "registering `{}` as `{}` with strategy {:?}",
            key.name(),
            type_id,
            strategy
        );
        self.ids.insert(type_id.to_owned(), key);
        self.entries.insert(
            key.type_id(),
            TypeEntry {
                type_key: key,
                type_id: type_id.to_owned(),
                strategy,
            },
        );
        Ok(())
    }

    /// Resolves the registry entry for an object by walking its lineage,
    /// most-derived first. An unregistered subclass inherits the nearest
    /// registered ancestor's wire identity.
    pub(crate) fn dispatch(&self, obj: &dyn Reflect) -> Result<&TypeEntry, Error> {
        for key in obj.lineage() {
            if let Some(entry) = self.entries.get(&key.type_id()) {
                return Ok(entry);
            }
        }
        Err(Error::unknown_type(
            obj.type_key().name(),
            format!("{:?}", obj),
        ))
    }

    pub(crate) fn custom_codec(&self, type_id: &str) -> Option<&CustomCodec> {
        self.codecs.get(type_id)
    }

    /// Resolves a non-opaque wire type id at deserialize time. Custom codecs
    /// take precedence over the reflection reverse mapping.
    pub(crate) fn resolve(&self, type_id: &str) -> Result<Resolution<'_>, Error> {
        if let Some(codec) = self.codecs.get(type_id) {
            return Ok(Resolution::Custom(codec));
        }
        if let Some(reconstruct) = self.reverse.get(type_id) {
            return Ok(Resolution::Reflection(*reconstruct));
        }
        Err(Error::unregistered_type_id(type_id))
    }

    /// Resolves the reconstructor of an opaque blob's embedded tag. This
    /// deliberately bypasses the reverse mapping; an unknown tag is corrupt
    /// or foreign data, not an unregistered type id.
    pub(crate) fn resolve_opaque(&self, type_id: &str) -> Result<ReconstructFn, Error> {
        self.opaque.get(type_id).copied().ok_or_else(|| {
            Error::invalid_data(format!(
                "opaque blob tag `{}` has no opaque registration in this context",
                type_id
            ))
        })
    }

    pub(crate) fn blob_codec(&self) -> &dyn BlobCodec {
        self.blob_codec.as_ref()
    }

    /// Looks up the entry registered for `T`, if any.
    pub fn entry_of<T: Reflect>(&self) -> Option<&TypeEntry> {
        self.entries.get(&TypeId::of::<T>())
    }

    /// Looks up the entry owning a wire type id, if any.
    pub fn entry_by_id(&self, type_id: &str) -> Option<&TypeEntry> {
        let key = self.ids.get(type_id)?;
        self.entries.get(&key.type_id())
    }
}

static DEFAULT_CONTEXT: OnceLock<RwLock<SerializationContext>> = OnceLock::new();

/// The process-wide default registry. Every engine operation accepts an
/// explicit context; this instance is sugar for call sites that omit one,
/// never a hidden dependency.
pub fn default_context() -> &'static RwLock<SerializationContext> {
    DEFAULT_CONTEXT.get_or_init(|| RwLock::new(SerializationContext::new()))
}
