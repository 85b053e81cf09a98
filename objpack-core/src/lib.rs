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

//! # objpack core
//!
//! Core implementation of the objpack object-graph serialization engine:
//! it turns arbitrary in-memory object graphs, including application-defined
//! types, into a self-describing buffer-oriented wire form and reconstructs
//! equivalent objects from it, zero-copy where the backing storage allows.
//!
//! ## Architecture
//!
//! - **`context`**: the type registry mapping application types to stable
//!   wire ids and serialization strategies
//! - **`engine`**: the serializer/deserializer walks and the functional API
//! - **`envelope`**: the serialized envelope, its framed stream form, and
//!   its decomposition into independently transferable components
//! - **`reflect`**: the explicit describe-fields / construct-from-parts
//!   contract application types implement
//! - **`value`**: the dynamic object-graph model
//! - **`buffer`**: little-endian binary Writer/Reader management
//! - **`types`**: wire tag constants
//! - **`error`**: error handling and result types
//!
//! ## Strategies
//!
//! A registered type serializes by exactly one of three strategies, chosen
//! consistently on both sides of the wire:
//!
//! - **Opaque blob**: the object travels as one blob segment produced
//!   through the context's pluggable byte transform
//! - **Custom codec**: a user-supplied encode/decode closure pair
//! - **Generic reflection**: the type's own reflected parts, rebuilt through
//!   its from-raw-parts constructor
//!
//! Dispatch walks an object's explicit ancestry lineage, most-derived first,
//! so unregistered subtypes inherit the nearest registered ancestor's wire
//! identity.

pub mod buffer;
pub mod context;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod reflect;
pub mod types;
pub mod value;
