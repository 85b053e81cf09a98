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
    deserialize, deserialize_from, read_serialized, serialize, serialize_to, Bytes, Error,
    SerializationContext, SerializedEnvelope, Value,
};

use common::Point;

fn sample_context() -> SerializationContext {
    let mut context = SerializationContext::new();
    context.register::<Point>("point").unwrap();
    context
}

fn sample_value() -> Value {
    Value::List(vec![
        Value::object(Point { x: -4, y: 11 }),
        Value::Buffer(Bytes::from(vec![0xEE; 300])),
        Value::Str("tail".into()),
    ])
}

#[test]
fn total_bytes_matches_write_to() {
    let context = sample_context();
    let envelope = serialize(&sample_value(), Some(&context)).unwrap();
    let mut sink = Vec::new();
    envelope.write_to(&mut sink).unwrap();
    assert_eq!(envelope.total_bytes().unwrap(), sink.len());
}

#[test]
fn to_buffer_is_parallelism_invariant() {
    let context = sample_context();
    let envelope = serialize(&sample_value(), Some(&context)).unwrap();
    let serial = envelope.to_buffer(1).unwrap();
    let parallel = envelope.to_buffer(4).unwrap();
    let excessive = envelope.to_buffer(64).unwrap();
    assert_eq!(serial, parallel);
    assert_eq!(serial, excessive);
    assert_eq!(serial.len(), envelope.total_bytes().unwrap());

    let mut streamed = Vec::new();
    envelope.write_to(&mut streamed).unwrap();
    assert_eq!(serial.as_ref(), streamed.as_slice());
}

#[test]
fn stream_round_trip() {
    let context = sample_context();
    let value = sample_value();
    let mut stream = Vec::new();
    serialize_to(&value, &mut stream, Some(&context)).unwrap();
    let result = deserialize_from(&mut stream.as_slice(), Some(&context)).unwrap();
    assert_eq!(result, value);
}

#[test]
fn read_serialized_defers_deserialization() {
    let context = sample_context();
    let value = sample_value();
    let mut stream = Vec::new();
    serialize_to(&value, &mut stream, Some(&context)).unwrap();

    let envelope = read_serialized(&mut stream.as_slice()).unwrap();
    assert_eq!(envelope.num_array_segments(), 1);
    assert_eq!(envelope.deserialize(Some(&context)).unwrap(), value);
}

#[test]
fn from_buffer_slices_are_zero_copy() {
    let context = sample_context();
    let contiguous = serialize(&sample_value(), Some(&context))
        .unwrap()
        .to_buffer(1)
        .unwrap();

    let envelope = SerializedEnvelope::from_buffer(contiguous.clone()).unwrap();
    let components = envelope.to_components();
    let backing = contiguous.as_ref().as_ptr_range();
    for buffer in &components.buffers {
        // every buffer is a view anchored on the source allocation
        assert!(backing.contains(&buffer.as_ptr()));
    }
    assert_eq!(envelope.deserialize(Some(&context)).unwrap(), sample_value());
}

#[test]
fn deserialize_accepts_contiguous_bytes() {
    let context = sample_context();
    let value = sample_value();
    let buffer = serialize(&value, Some(&context))
        .unwrap()
        .to_buffer(1)
        .unwrap();
    assert_eq!(deserialize(buffer, Some(&context)).unwrap(), value);
}

#[test]
fn corrupt_magic_is_rejected() {
    let err = deserialize(vec![0u8; 16], None).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}

#[test]
fn truncated_stream_is_rejected() {
    let context = sample_context();
    let buffer = serialize(&sample_value(), Some(&context))
        .unwrap()
        .to_buffer(1)
        .unwrap();
    let truncated = buffer.slice(..buffer.len() - 10);
    assert!(matches!(
        SerializedEnvelope::from_buffer(truncated),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn empty_input_is_rejected() {
    assert!(matches!(
        deserialize(Vec::<u8>::new(), None),
        Err(Error::BufferOutOfBound(_, _, _))
    ));
}
