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

//! The reflection contract application types opt into.
//!
//! The engine never introspects a type at runtime. A type that wants to
//! travel through the engine without a custom codec implements the explicit
//! capability pair: [`Reflect::reflect`] describes the instance as [`Parts`],
//! and [`Reconstruct::from_parts`] rebuilds an instance from those parts
//! without running any ordinary construction logic. Ancestry is equally
//! explicit: [`Reflect::lineage`] lists the type identities the registry may
//! match, most-derived first.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::Error;
use crate::value::Value;

/// Stable in-process type identity: the `std::any::TypeId` plus the type
/// name for diagnostics.
#[derive(Clone, Copy, Debug)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> TypeKey {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline(always)]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The tagged reconstruction variant captured by [`Reflect::reflect`].
///
/// `Args` suits fixed-field tuple-like records rebuilt positionally;
/// `Fields` is the field-bag view populated by name.
#[derive(Debug, PartialEq)]
pub enum Parts {
    Args(Vec<Value>),
    Fields(BTreeMap<String, Value>),
}

/// Object-safe half of the reflection contract: identity, ancestry, and the
/// describe-fields capability.
pub trait Reflect: Any + Debug {
    /// Concrete identity of this instance.
    fn type_key(&self) -> TypeKey;

    /// Explicit ancestry linearization, most-derived first. The first entry
    /// must equal [`Reflect::type_key`]; registry dispatch walks this list
    /// in order.
    fn lineage(&self) -> Vec<TypeKey> {
        vec![self.type_key()]
    }

    /// Describe this instance as reconstruction parts.
    fn reflect(&self) -> Result<Parts, Error>;

    /// Value equality across `dyn Reflect`. The default compares concrete
    /// identity and reflected parts.
    fn reflect_eq(&self, other: &dyn Reflect) -> bool {
        self.type_key() == other.type_key()
            && matches!((self.reflect(), other.reflect()), (Ok(a), Ok(b)) if a == b)
    }

    fn as_any(&self) -> &dyn Any;
}

/// Sized half of the contract: the two-phase "from-raw-parts" constructor.
/// Implementations must not run the type's ordinary initialization logic.
pub trait Reconstruct: Reflect + Sized {
    fn from_parts(parts: Parts) -> Result<Self, Error>;
}
