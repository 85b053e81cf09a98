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

mod common;

use objpack::{serialize, Error, SerializationContext, Strategy, Value};

use common::{Point, Truck, User, Vehicle};

#[test]
fn register_is_idempotent_for_identical_binding() {
    let mut context = SerializationContext::new();
    context.register::<Point>("point").unwrap();
    context.register::<Point>("point").unwrap();
    assert_eq!(
        context.entry_of::<Point>().unwrap().strategy(),
        Strategy::GenericReflection
    );
}

#[test]
fn type_id_cannot_alias_two_types() {
    let mut context = SerializationContext::new();
    context.register::<Point>("shared").unwrap();
    let err = context.register::<User>("shared").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn type_cannot_change_id_or_strategy() {
    let mut context = SerializationContext::new();
    context.register::<Point>("point").unwrap();
    assert!(matches!(
        context.register::<Point>("point2"),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        context.register_opaque::<Point>("point"),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn unknown_type_fails_serialization() {
    let context = SerializationContext::new();
    let err = serialize(&Value::object(Point { x: 1, y: 2 }), Some(&context)).unwrap_err();
    match err {
        Error::UnknownType(name, object) => {
            assert!(name.contains("Point"));
            assert!(object.contains("Point"));
        }
        other => panic!("expected UnknownType, got {:?}", other),
    }
}

#[test]
fn clone_independence() {
    let original = SerializationContext::new();
    let mut branched = original.clone();
    branched.register::<Point>("point").unwrap();

    // the branch serializes fine
    serialize(&Value::object(Point { x: 1, y: 2 }), Some(&branched)).unwrap();
    // the original is untouched
    assert!(matches!(
        serialize(&Value::object(Point { x: 1, y: 2 }), Some(&original)),
        Err(Error::UnknownType(_, _))
    ));
}

#[test]
fn ancestor_dispatch_inherits_wire_identity() {
    let mut context = SerializationContext::new();
    context.register::<Vehicle>("vehicle").unwrap();

    // Truck is unregistered; its lineage resolves to Vehicle, so the wire
    // carries "vehicle" and deserialization rebuilds a Vehicle.
    let envelope = serialize(&Value::object(Truck { wheels: 6 }), Some(&context)).unwrap();
    let value = envelope.deserialize(Some(&context)).unwrap();
    assert_eq!(
        value.downcast_object::<Vehicle>(),
        Some(&Vehicle { wheels: 6 })
    );
    assert!(value.downcast_object::<Truck>().is_none());
}

#[test]
fn registered_subtype_wins_over_ancestor() {
    let mut context = SerializationContext::new();
    context.register::<Vehicle>("vehicle").unwrap();
    context.register::<Truck>("truck").unwrap();

    let envelope = serialize(&Value::object(Truck { wheels: 18 }), Some(&context)).unwrap();
    let value = envelope.deserialize(Some(&context)).unwrap();
    assert_eq!(value.downcast_object::<Truck>(), Some(&Truck { wheels: 18 }));
}

#[test]
fn entry_lookup_by_id() {
    let mut context = SerializationContext::new();
    context.register::<Point>("point").unwrap();
    let entry = context.entry_by_id("point").unwrap();
    assert_eq!(entry.type_id(), "point");
    assert!(context.entry_by_id("missing").is_none());
}
