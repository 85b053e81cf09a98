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

//! The serializer and deserializer engines, plus the functional API.
//!
//! The serializer walks one [`Value`] graph, consulting the registry for
//! every `Object` node, and produces a [`SerializedEnvelope`]: a metadata
//! stream plus the payload buffers hoisted out of the graph. The
//! deserializer runs the inverse walk. Engines never call each other; the
//! registry is a leaf dependency of both.
//!
//! The root is wrapped as a single-element list so scalar and composite
//! graphs share one code path.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use bytes::Bytes;
use chrono::TimeDelta;
use log::debug;

use crate::buffer::{Reader, Writer};
use crate::context::{default_context, Resolution, SerializationContext, Strategy};
use crate::envelope::{Components, SerializedEnvelope};
use crate::error::Error;
use crate::reflect::{Parts, Reflect};
use crate::types::{NodeKind, StrategyTag};
use crate::value::Value;

pub(crate) fn with_context<R>(
    context: Option<&SerializationContext>,
    f: impl FnOnce(&SerializationContext) -> R,
) -> R {
    match context {
        Some(ctx) => f(ctx),
        None => {
            let guard = default_context()
                .read()
                .expect("default serialization context lock poisoned");
            f(&guard)
        }
    }
}

/// Serializes one object graph into an envelope under the given context, or
/// the process-wide default when `context` is `None`.
pub fn serialize(
    value: &Value,
    context: Option<&SerializationContext>,
) -> Result<SerializedEnvelope, Error> {
    with_context(context, |ctx| {
        let mut encoder = Encoder::new(ctx, false);
        encoder.writer.write_u8(NodeKind::List.into());
        encoder.writer.write_varuint32(1);
        encoder.encode(value)?;
        let envelope = SerializedEnvelope::new(
            encoder.writer.into_bytes(),
            encoder.payloads,
            encoder.num_opaque,
            encoder.num_array,
        );
        debug!(
            "serialized graph: {} opaque, {} array, {} raw buffers",
            envelope.num_opaque_segments(),
            envelope.num_array_segments(),
            envelope.num_raw_buffers()
        );
        Ok(envelope)
    })
}

/// Serializes and streams the framed envelope into `sink`.
pub fn serialize_to<W: Write>(
    value: &Value,
    sink: &mut W,
    context: Option<&SerializationContext>,
) -> Result<(), Error> {
    serialize(value, context)?.write_to(sink)
}

/// Reads a framed envelope from `source` without deserializing it. The
/// stream is materialized into one owned buffer; payload buffers become
/// zero-copy views of it. To anchor payloads on an existing buffer instead,
/// use [`SerializedEnvelope::from_buffer`].
pub fn read_serialized<R: Read>(source: &mut R) -> Result<SerializedEnvelope, Error> {
    let mut buf = Vec::new();
    source.read_to_end(&mut buf)?;
    SerializedEnvelope::from_buffer(Bytes::from(buf))
}

/// Reads a framed envelope from `source` and deserializes it.
pub fn deserialize_from<R: Read>(
    source: &mut R,
    context: Option<&SerializationContext>,
) -> Result<Value, Error> {
    read_serialized(source)?.deserialize(context)
}

/// Deserializes a framed envelope held in a buffer or byte slice. Passing
/// [`Bytes`] keeps payload buffers zero-copy; a `&[u8]` or `Vec<u8>` is
/// copied into fresh backing first.
pub fn deserialize(
    data: impl Into<Bytes>,
    context: Option<&SerializationContext>,
) -> Result<Value, Error> {
    SerializedEnvelope::from_buffer(data.into())?.deserialize(context)
}

/// Reassembles a components bundle and deserializes it.
pub fn deserialize_components(
    components: Components,
    context: Option<&SerializationContext>,
) -> Result<Value, Error> {
    SerializedEnvelope::from_components(components)?.deserialize(context)
}

pub(crate) fn decode_envelope(
    envelope: &SerializedEnvelope,
    context: &SerializationContext,
) -> Result<Value, Error> {
    let mut decoder = Decoder {
        context,
        reader: Reader::new(envelope.meta_buffer().clone()),
        payloads: envelope.payload_buffers(),
        inline: false,
        depth: 0,
    };
    let kind = decoder.read_kind()?;
    if kind != NodeKind::List {
        return Err(Error::invalid_data("envelope root is not a wrapped graph"));
    }
    let len = decoder.reader.read_varuint32()?;
    if len != 1 {
        return Err(Error::invalid_data(
            "envelope root must wrap exactly one object",
        ));
    }
    let value = decoder.decode()?;
    if decoder.reader.remaining() != 0 {
        return Err(Error::invalid_data(
            "trailing bytes after envelope metadata",
        ));
    }
    Ok(value)
}

struct Encoder<'a> {
    context: &'a SerializationContext,
    writer: Writer,
    payloads: Vec<Bytes>,
    num_opaque: usize,
    num_array: usize,
    /// Inside an opaque blob everything is inlined: nested buffers and
    /// nested opaque objects must not escape into the payload table.
    inline: bool,
}

impl<'a> Encoder<'a> {
    fn new(context: &'a SerializationContext, inline: bool) -> Encoder<'a> {
        Encoder {
            context,
            writer: Writer::default(),
            payloads: Vec::new(),
            num_opaque: 0,
            num_array: 0,
            inline,
        }
    }

    fn encode(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Null => self.writer.write_u8(NodeKind::Null.into()),
            Value::Bool(v) => {
                self.writer.write_u8(NodeKind::Bool.into());
                self.writer.write_u8(*v as u8);
            }
            Value::I64(v) => {
                self.writer.write_u8(NodeKind::I64.into());
                self.writer.write_varint64(*v);
            }
            Value::F64(v) => {
                self.writer.write_u8(NodeKind::F64.into());
                self.writer.write_f64(*v);
            }
            Value::Str(s) => {
                self.writer.write_u8(NodeKind::Str.into());
                self.writer.write_str(s);
            }
            Value::Bytes(b) => {
                self.writer.write_u8(NodeKind::Bytes.into());
                self.writer.write_varuint32(b.len() as u32);
                self.writer.write_bytes(b);
            }
            Value::Date(d) => {
                self.writer.write_u8(NodeKind::Date.into());
                let days = d
                    .signed_duration_since(chrono::NaiveDate::default())
                    .num_days();
                self.writer.write_varint64(days);
            }
            Value::Timestamp(ts) => {
                self.writer.write_u8(NodeKind::Timestamp.into());
                self.writer.write_varint64(ts.and_utc().timestamp_micros());
            }
            Value::List(items) => {
                self.writer.write_u8(NodeKind::List.into());
                self.writer.write_varuint32(items.len() as u32);
                for item in items {
                    self.encode(item)?;
                }
            }
            Value::Map(map) => {
                self.writer.write_u8(NodeKind::Map.into());
                self.writer.write_varuint32(map.len() as u32);
                for (key, item) in map {
                    self.writer.write_str(key);
                    self.encode(item)?;
                }
            }
            Value::Buffer(buffer) => {
                self.writer.write_u8(NodeKind::Buffer.into());
                if self.inline {
                    self.writer.write_varuint32(buffer.len() as u32);
                    self.writer.write_bytes(buffer);
                } else {
                    self.writer.write_varuint32(self.payloads.len() as u32);
                    self.payloads.push(buffer.clone());
                    self.num_array += 1;
                }
            }
            Value::Object(obj) => self.encode_object(obj.as_ref())?,
        }
        Ok(())
    }

    fn encode_object(&mut self, obj: &dyn Reflect) -> Result<(), Error> {
        let entry = self.context.dispatch(obj)?;
        let type_id = entry.type_id().to_owned();
        match entry.strategy() {
            Strategy::OpaqueBlob => {
                let parts = obj.reflect()?;
                let mut blob_encoder = Encoder::new(self.context, true);
                blob_encoder.encode_tagged_parts(&type_id, &parts)?;
                let blob = self.context.blob_codec().encode(&blob_encoder.writer.dump())?;
                self.writer.write_u8(NodeKind::Tagged.into());
                self.writer.write_u8(StrategyTag::Opaque.into());
                if self.inline {
                    self.writer.write_varuint32(blob.len() as u32);
                    self.writer.write_bytes(&blob);
                } else {
                    self.writer.write_varuint32(self.payloads.len() as u32);
                    self.payloads.push(Bytes::from(blob));
                    self.num_opaque += 1;
                }
            }
            Strategy::CustomCodec => {
                let codec = self.context.custom_codec(&type_id).ok_or_else(|| {
                    Error::configuration(format!(
                        "registry entry `{}` claims a custom codec but none is stored",
                        type_id
                    ))
                })?;
                let encoded = codec.encode(obj)?;
                self.writer.write_u8(NodeKind::Tagged.into());
                self.writer.write_u8(StrategyTag::Custom.into());
                self.writer.write_str(&type_id);
                self.encode(&encoded)?;
            }
            Strategy::GenericReflection => {
                let parts = obj.reflect()?;
                self.writer.write_u8(NodeKind::Tagged.into());
                self.encode_tagged_parts(&type_id, &parts)?;
            }
        }
        Ok(())
    }

    /// `[tag][type_id][payload]` — shared between reflection-tagged nodes
    /// and the self-contained content of an opaque blob.
    fn encode_tagged_parts(&mut self, type_id: &str, parts: &Parts) -> Result<(), Error> {
        match parts {
            Parts::Args(items) => {
                self.writer.write_u8(StrategyTag::Args.into());
                self.writer.write_str(type_id);
                self.writer.write_varuint32(items.len() as u32);
                for item in items {
                    self.encode(item)?;
                }
            }
            Parts::Fields(fields) => {
                self.writer.write_u8(StrategyTag::Fields.into());
                self.writer.write_str(type_id);
                self.writer.write_varuint32(fields.len() as u32);
                for (key, value) in fields {
                    self.writer.write_str(key);
                    self.encode(value)?;
                }
            }
        }
        Ok(())
    }
}

/// Depth bound on decoded graphs. Wire data is untrusted; unbounded nesting
/// would exhaust the stack before it exhausts the buffer.
const MAX_NESTING_DEPTH: u32 = 1024;

struct Decoder<'a> {
    context: &'a SerializationContext,
    reader: Reader,
    payloads: &'a [Bytes],
    inline: bool,
    depth: u32,
}

impl<'a> Decoder<'a> {
    fn read_kind(&mut self) -> Result<NodeKind, Error> {
        let raw = self.reader.read_u8()?;
        NodeKind::try_from(raw)
            .map_err(|_| Error::invalid_data(format!("unknown node kind tag {}", raw)))
    }

    fn read_strategy(&mut self) -> Result<StrategyTag, Error> {
        let raw = self.reader.read_u8()?;
        StrategyTag::try_from(raw)
            .map_err(|_| Error::invalid_data(format!("unknown strategy tag {}", raw)))
    }

    fn decode(&mut self) -> Result<Value, Error> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(Error::invalid_data(format!(
                "maximum nesting depth ({}) exceeded",
                MAX_NESTING_DEPTH
            )));
        }
        let value = self.decode_node();
        self.depth -= 1;
        value
    }

    fn decode_node(&mut self) -> Result<Value, Error> {
        let kind = self.read_kind()?;
        match kind {
            NodeKind::Null => Ok(Value::Null),
            NodeKind::Bool => Ok(Value::Bool(self.reader.read_u8()? != 0)),
            NodeKind::I64 => Ok(Value::I64(self.reader.read_varint64()?)),
            NodeKind::F64 => Ok(Value::F64(self.reader.read_f64()?)),
            NodeKind::Str => Ok(Value::Str(self.reader.read_str()?)),
            NodeKind::Bytes => {
                let len = self.reader.read_varuint32()? as usize;
                Ok(Value::Bytes(self.reader.read_slice(len)?.to_vec()))
            }
            NodeKind::Date => {
                let days = self.reader.read_varint64()?;
                TimeDelta::try_days(days)
                    .and_then(|delta| chrono::NaiveDate::default().checked_add_signed(delta))
                    .map(Value::Date)
                    .ok_or_else(|| Error::invalid_data("date value out of range"))
            }
            NodeKind::Timestamp => {
                let micros = self.reader.read_varint64()?;
                chrono::DateTime::from_timestamp_micros(micros)
                    .map(|ts| Value::Timestamp(ts.naive_utc()))
                    .ok_or_else(|| Error::invalid_data("timestamp value out of range"))
            }
            NodeKind::List => {
                let len = self.reader.read_varuint32()? as usize;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.decode()?);
                }
                Ok(Value::List(items))
            }
            NodeKind::Map => {
                let len = self.reader.read_varuint32()? as usize;
                let mut map = BTreeMap::new();
                for _ in 0..len {
                    let key = self.reader.read_str()?;
                    map.insert(key, self.decode()?);
                }
                Ok(Value::Map(map))
            }
            NodeKind::Buffer => {
                if self.inline {
                    let len = self.reader.read_varuint32()? as usize;
                    Ok(Value::Buffer(self.reader.read_shared(len)?))
                } else {
                    let index = self.reader.read_varuint32()? as usize;
                    self.payload(index).map(Value::Buffer)
                }
            }
            NodeKind::Tagged => self.decode_tagged(),
        }
    }

    fn payload(&self, index: usize) -> Result<Bytes, Error> {
        self.payloads.get(index).cloned().ok_or_else(|| {
            Error::invalid_data(format!(
                "payload reference {} exceeds the {} supplied buffers",
                index,
                self.payloads.len()
            ))
        })
    }

    fn decode_tagged(&mut self) -> Result<Value, Error> {
        let context = self.context;
        let strategy = self.read_strategy()?;
        match strategy {
            StrategyTag::Opaque => {
                let raw = if self.inline {
                    let len = self.reader.read_varuint32()? as usize;
                    self.reader.read_shared(len)?
                } else {
                    let index = self.reader.read_varuint32()? as usize;
                    self.payload(index)?
                };
                let blob = context.blob_codec().decode(&raw)?;
                let mut blob_decoder = Decoder {
                    context,
                    reader: Reader::new(Bytes::from(blob)),
                    payloads: &[],
                    inline: true,
                    depth: self.depth,
                };
                let (type_id, parts) = blob_decoder.decode_tagged_parts()?;
                if blob_decoder.reader.remaining() != 0 {
                    return Err(Error::invalid_data("trailing bytes in opaque blob"));
                }
                let reconstruct = context.resolve_opaque(&type_id)?;
                Ok(Value::Object(reconstruct(parts)?))
            }
            StrategyTag::Custom => {
                let type_id = self.reader.read_str()?;
                let payload = self.decode()?;
                match context.resolve(&type_id)? {
                    Resolution::Custom(codec) => Ok(Value::Object(codec.decode(payload)?)),
                    Resolution::Reflection(_) => Err(Error::invalid_data(format!(
                        "payload for `{}` was written with a custom codec, \
                         but the consuming context registers none",
                        type_id
                    ))),
                }
            }
            StrategyTag::Args | StrategyTag::Fields => {
                let type_id = self.reader.read_str()?;
                let parts = self.decode_parts_payload(strategy)?;
                match context.resolve(&type_id)? {
                    Resolution::Custom(codec) => codec
                        .decode(parts_to_value(parts))
                        .map(Value::Object),
                    Resolution::Reflection(reconstruct) => Ok(Value::Object(reconstruct(parts)?)),
                }
            }
        }
    }

    /// Inverse of [`Encoder::encode_tagged_parts`].
    fn decode_tagged_parts(&mut self) -> Result<(String, Parts), Error> {
        let tag = self.read_strategy()?;
        if !matches!(tag, StrategyTag::Args | StrategyTag::Fields) {
            return Err(Error::invalid_data(
                "opaque blob content must carry reflected parts",
            ));
        }
        let type_id = self.reader.read_str()?;
        let parts = self.decode_parts_payload(tag)?;
        Ok((type_id, parts))
    }

    fn decode_parts_payload(&mut self, tag: StrategyTag) -> Result<Parts, Error> {
        match tag {
            StrategyTag::Args => {
                let len = self.reader.read_varuint32()? as usize;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.decode()?);
                }
                Ok(Parts::Args(items))
            }
            StrategyTag::Fields => {
                let len = self.reader.read_varuint32()? as usize;
                let mut fields = BTreeMap::new();
                for _ in 0..len {
                    let key = self.reader.read_str()?;
                    fields.insert(key, self.decode()?);
                }
                Ok(Parts::Fields(fields))
            }
            _ => Err(Error::invalid_data("tag does not carry reflected parts")),
        }
    }
}

fn parts_to_value(parts: Parts) -> Value {
    match parts {
        Parts::Args(items) => Value::List(items),
        Parts::Fields(fields) => Value::Map(fields),
    }
}
