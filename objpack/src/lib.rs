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

//! # objpack
//!
//! objpack serializes arbitrary in-memory object graphs — including
//! application-defined types — into a self-describing, buffer-oriented wire
//! representation and reconstructs equivalent objects from it, zero-copy
//! where the backing storage allows.
//!
//! ## Key Concepts
//!
//! - **Type registry**: a [`SerializationContext`] maps application types to
//!   stable wire type ids and to one of three strategies: opaque blob,
//!   custom codec, or generic reflection. Dispatch walks an object's
//!   explicit ancestry lineage, so unregistered subtypes inherit the nearest
//!   registered ancestor's wire identity.
//! - **Envelope and components**: serialization yields a
//!   [`SerializedEnvelope`] that can stream into any [`std::io::Write`]
//!   sink, materialize into one contiguous buffer, or decompose into a
//!   [`Components`] bundle whose payload buffers transfer by reference.
//! - **Explicit reflection**: types without a custom codec implement the
//!   [`Reflect`]/[`Reconstruct`] capability pair; the engine never
//!   introspects types at runtime, and reconstruction never runs ordinary
//!   construction logic.
//!
//! ## Example
//!
//! ```rust
//! use objpack::{serialize, Error, Parts, Reconstruct, Reflect, SerializationContext, TypeKey, Value};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl Reflect for Point {
//!     fn type_key(&self) -> TypeKey {
//!         TypeKey::of::<Point>()
//!     }
//!
//!     fn reflect(&self) -> Result<Parts, Error> {
//!         Ok(Parts::Args(vec![Value::I64(self.x), Value::I64(self.y)]))
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! impl Reconstruct for Point {
//!     fn from_parts(parts: Parts) -> Result<Point, Error> {
//!         match parts {
//!             Parts::Args(args) => match args.as_slice() {
//!                 [Value::I64(x), Value::I64(y)] => Ok(Point { x: *x, y: *y }),
//!                 _ => Err(Error::invalid_data("point takes two integer arguments")),
//!             },
//!             _ => Err(Error::invalid_data("point reconstructs from arguments")),
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), Error> {
//! let mut context = SerializationContext::new();
//! context.register::<Point>("point")?;
//!
//! let envelope = serialize(&Value::object(Point { x: 3, y: 4 }), Some(&context))?;
//! let value = envelope.deserialize(Some(&context))?;
//! assert_eq!(value.downcast_object::<Point>(), Some(&Point { x: 3, y: 4 }));
//!
//! // Decompose into zero-copy components and reassemble on the other side.
//! let components = envelope.to_components();
//! let rebuilt = objpack::deserialize_components(components, Some(&context))?;
//! assert_eq!(rebuilt, value);
//! # Ok(())
//! # }
//! ```

pub use bytes::Bytes;

pub use objpack_core::buffer::{Reader, Writer};
pub use objpack_core::context::{
    default_context, BlobCodec, PassthroughCodec, SerializationContext, Strategy, TypeEntry,
};
pub use objpack_core::engine::{
    deserialize, deserialize_components, deserialize_from, read_serialized, serialize,
    serialize_to,
};
pub use objpack_core::envelope::{Components, CountingSink, SerializedEnvelope};
pub use objpack_core::error::Error;
pub use objpack_core::reflect::{Parts, Reconstruct, Reflect, TypeKey};
pub use objpack_core::value::Value;
pub use objpack_core::{bail, ensure};
