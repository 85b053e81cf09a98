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

use objpack::{
    deserialize_components, serialize, Bytes, Error, SerializationContext, SerializedEnvelope,
    Value,
};

use common::{BigBlob, Point};

#[test]
fn components_round_trip() {
    let mut context = SerializationContext::new();
    context.register::<Point>("point").unwrap();
    let value = Value::List(vec![
        Value::object(Point { x: 1, y: 2 }),
        Value::Buffer(Bytes::from(vec![3u8; 512])),
    ]);
    let envelope = serialize(&value, Some(&context)).unwrap();
    let components = envelope.to_components();
    assert_eq!(components.num_array_segments, 1);
    assert_eq!(components.num_opaque_segments, 0);
    assert_eq!(components.num_raw_buffers, 2);
    assert_eq!(components.buffers.len(), 2);

    let rebuilt = SerializedEnvelope::from_components(components).unwrap();
    assert_eq!(rebuilt.deserialize(Some(&context)).unwrap(), value);
}

#[test]
fn components_share_payload_storage() {
    let context = SerializationContext::new();
    let payload = Bytes::from(vec![9u8; 1024]);
    let envelope = serialize(&Value::Buffer(payload.clone()), Some(&context)).unwrap();
    let components = envelope.to_components();
    // the payload buffer is transferred by reference, not copied
    assert_eq!(components.buffers[1].as_ptr(), payload.as_ptr());
}

#[test]
fn count_mismatch_is_rejected() {
    let context = SerializationContext::new();
    let envelope = serialize(&Value::I64(7), Some(&context)).unwrap();

    let mut lying = envelope.to_components();
    lying.num_raw_buffers += 1;
    assert!(matches!(
        SerializedEnvelope::from_components(lying),
        Err(Error::InvalidComponents(_))
    ));

    let mut dropped = envelope.to_components();
    dropped.buffers.pop();
    assert!(matches!(
        SerializedEnvelope::from_components(dropped),
        Err(Error::InvalidComponents(_))
    ));

    let mut shifted = envelope.to_components();
    shifted.num_opaque_segments += 1;
    assert!(matches!(
        SerializedEnvelope::from_components(shifted),
        Err(Error::InvalidComponents(_))
    ));
}

#[test]
fn buffers_are_consumed_in_emission_order() {
    let context = SerializationContext::new();
    let first = Bytes::from_static(b"first");
    let second = Bytes::from_static(b"second");
    let value = Value::List(vec![
        Value::Buffer(first.clone()),
        Value::Buffer(second.clone()),
    ]);
    let components = serialize(&value, Some(&context)).unwrap().to_components();
    assert_eq!(components.buffers[1], first);
    assert_eq!(components.buffers[2], second);

    let rebuilt = deserialize_components(components, Some(&context)).unwrap();
    assert_eq!(rebuilt, value);
}

#[test]
fn big_blob_scenario() {
    let mut context = SerializationContext::new();
    context.register_opaque::<BigBlob>("bigblob").unwrap();
    let blob = BigBlob {
        payload: vec![0x5A; 2048],
    };
    let envelope = serialize(&Value::object(blob), Some(&context)).unwrap();
    let components = envelope.to_components();
    assert_eq!(components.num_opaque_segments, 1);
    assert_eq!(components.num_array_segments, 0);
    assert_eq!(components.num_raw_buffers, 2);

    // opaque segments never consult the reverse mapping: a context whose
    // only binding for "bigblob" is the opaque registration decodes it
    let mut receiver = SerializationContext::new();
    receiver.register_opaque::<BigBlob>("bigblob").unwrap();
    let value = deserialize_components(components, Some(&receiver)).unwrap();
    assert_eq!(
        value.downcast_object::<BigBlob>().unwrap().payload,
        vec![0x5A; 2048]
    );
}

#[test]
fn opaque_tag_missing_is_not_unregistered_type_id() {
    let mut sender = SerializationContext::new();
    sender.register_opaque::<BigBlob>("bigblob").unwrap();
    let components = serialize(
        &Value::object(BigBlob {
            payload: vec![1, 2, 3],
        }),
        Some(&sender),
    )
    .unwrap()
    .to_components();

    // a context that binds "bigblob" through the reverse mapping instead of
    // the opaque table cannot decode the segment, and the failure is a data
    // error rather than UnregisteredTypeId
    let mut receiver = SerializationContext::new();
    receiver.register::<Point>("bigblob").unwrap();
    let err = deserialize_components(components, Some(&receiver)).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}

#[test]
fn unregistered_type_id_on_deserialize() {
    let mut sender = SerializationContext::new();
    sender.register::<Point>("point").unwrap();
    let components = serialize(&Value::object(Point { x: 1, y: 2 }), Some(&sender))
        .unwrap()
        .to_components();

    let receiver = SerializationContext::new();
    assert!(matches!(
        deserialize_components(components, Some(&receiver)),
        Err(Error::UnregisteredTypeId(id)) if id == "point"
    ));
}
