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

//! The serialized envelope and its buffer-oriented decomposition.
//!
//! An envelope is a metadata buffer plus the payload buffers hoisted out of
//! the graph. It can be streamed into a sink as one framed byte stream,
//! materialized into a single contiguous buffer, or decomposed into a
//! [`Components`] bundle whose buffers travel by reference. Framed stream
//! layout: magic, flags, the three segment counts, one u64 length per raw
//! buffer, then the buffer bytes in emission order.

use std::io::{self, Write};

use bytes::Bytes;
use log::trace;

use crate::buffer::{Reader, Writer};
use crate::context::SerializationContext;
use crate::engine;
use crate::ensure;
use crate::error::Error;
use crate::types::{format_flags, MAGIC_NUMBER};
use crate::value::Value;

/// The decomposed, zero-copy transfer unit: small copyable counts plus the
/// ordered raw buffers. Reconstruction consumes buffers in exactly this
/// order; the bundle is order-dependent.
#[derive(Clone, Debug)]
pub struct Components {
    pub num_opaque_segments: usize,
    pub num_array_segments: usize,
    pub num_raw_buffers: usize,
    pub buffers: Vec<Bytes>,
}

/// The result of serializing one object graph.
#[derive(Debug)]
pub struct SerializedEnvelope {
    meta: Bytes,
    payloads: Vec<Bytes>,
    num_opaque_segments: usize,
    num_array_segments: usize,
}

impl SerializedEnvelope {
    pub(crate) fn new(
        meta: Bytes,
        payloads: Vec<Bytes>,
        num_opaque_segments: usize,
        num_array_segments: usize,
    ) -> SerializedEnvelope {
        debug_assert_eq!(payloads.len(), num_opaque_segments + num_array_segments);
        SerializedEnvelope {
            meta,
            payloads,
            num_opaque_segments,
            num_array_segments,
        }
    }

    #[inline(always)]
    pub fn num_opaque_segments(&self) -> usize {
        self.num_opaque_segments
    }

    #[inline(always)]
    pub fn num_array_segments(&self) -> usize {
        self.num_array_segments
    }

    /// Total raw buffers carried: the metadata buffer plus one per segment.
    #[inline(always)]
    pub fn num_raw_buffers(&self) -> usize {
        1 + self.payloads.len()
    }

    pub(crate) fn meta_buffer(&self) -> &Bytes {
        &self.meta
    }

    pub(crate) fn payload_buffers(&self) -> &[Bytes] {
        &self.payloads
    }

    fn header_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::default();
        writer.write_u16(MAGIC_NUMBER);
        writer.write_u8(format_flags::IS_LITTLE_ENDIAN_FLAG);
        writer.write_varuint32(self.num_opaque_segments as u32);
        writer.write_varuint32(self.num_array_segments as u32);
        writer.write_varuint32(self.num_raw_buffers() as u32);
        writer.write_u64(self.meta.len() as u64);
        for payload in &self.payloads {
            writer.write_u64(payload.len() as u64);
        }
        writer.dump()
    }

    /// Streams the framed envelope into `sink`, flushing before return.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> Result<(), Error> {
        sink.write_all(&self.header_bytes())?;
        sink.write_all(&self.meta)?;
        for payload in &self.payloads {
            sink.write_all(payload)?;
        }
        sink.flush()?;
        Ok(())
    }

    /// Size of the framed stream, computed by a dry-run write against a
    /// counting sink. Always equals the byte count [`write_to`] produces.
    ///
    /// [`write_to`]: SerializedEnvelope::write_to
    pub fn total_bytes(&self) -> Result<usize, Error> {
        let mut sink = CountingSink::default();
        self.write_to(&mut sink)?;
        Ok(sink.bytes_written())
    }

    /// Materializes the framed stream into one contiguous buffer.
    ///
    /// `parallelism` bounds how many worker threads copy disjoint buffer
    /// regions concurrently. It is purely a performance knob: the resulting
    /// bytes are identical for every value.
    pub fn to_buffer(&self, parallelism: usize) -> Result<Bytes, Error> {
        let header = self.header_bytes();
        let buffers: Vec<&Bytes> =
            std::iter::once(&self.meta).chain(self.payloads.iter()).collect();
        let total = header.len() + buffers.iter().map(|b| b.len()).sum::<usize>();
        let mut out = vec![0u8; total];

        let (head, mut rest) = out.split_at_mut(header.len());
        head.copy_from_slice(&header);
        let mut regions: Vec<(&[u8], &mut [u8])> = Vec::with_capacity(buffers.len());
        for buffer in buffers {
            let (region, tail) = std::mem::take(&mut rest).split_at_mut(buffer.len());
            regions.push((buffer.as_ref(), region));
            rest = tail;
        }

        let workers = parallelism.max(1).min(regions.len().max(1));
        if workers <= 1 {
            for (src, dst) in regions {
                dst.copy_from_slice(src);
            }
        } else {
            let per_worker = regions.len().div_ceil(workers);
            std::thread::scope(|scope| {
                for group in regions.chunks_mut(per_worker) {
                    scope.spawn(move || {
                        for (src, dst) in group.iter_mut() {
                            dst.copy_from_slice(src);
                        }
                    });
                }
            });
        }
        trace!("materialized envelope into {} bytes", total);
        Ok(Bytes::from(out))
    }

    /// Decomposes the envelope into its components bundle. Buffer payloads
    /// are shared, not copied.
    pub fn to_components(&self) -> Components {
        let mut buffers = Vec::with_capacity(self.num_raw_buffers());
        buffers.push(self.meta.clone());
        buffers.extend(self.payloads.iter().cloned());
        Components {
            num_opaque_segments: self.num_opaque_segments,
            num_array_segments: self.num_array_segments,
            num_raw_buffers: buffers.len(),
            buffers,
        }
    }

    /// Reassembles an envelope from a components bundle, the inverse of
    /// [`to_components`].
    ///
    /// [`to_components`]: SerializedEnvelope::to_components
    pub fn from_components(components: Components) -> Result<SerializedEnvelope, Error> {
        ensure!(
            components.num_raw_buffers == components.buffers.len(),
            Error::invalid_components(format!(
                "bundle claims {} raw buffers but supplies {}",
                components.num_raw_buffers,
                components.buffers.len()
            ))
        );
        ensure!(
            components.num_raw_buffers
                == 1 + components.num_opaque_segments + components.num_array_segments,
            Error::invalid_components(format!(
                "raw buffer count {} is inconsistent with {} opaque + {} array segments",
                components.num_raw_buffers,
                components.num_opaque_segments,
                components.num_array_segments
            ))
        );
        let mut buffers = components.buffers.into_iter();
        let meta = buffers.next().ok_or_else(|| {
            Error::invalid_components("bundle must carry at least the metadata buffer")
        })?;
        Ok(SerializedEnvelope {
            meta,
            payloads: buffers.collect(),
            num_opaque_segments: components.num_opaque_segments,
            num_array_segments: components.num_array_segments,
        })
    }

    /// Parses a framed stream held in `data` without copying: the metadata
    /// and payload buffers become views sharing `data`'s backing storage,
    /// which acts as the ownership anchor keeping them alive.
    pub fn from_buffer(data: Bytes) -> Result<SerializedEnvelope, Error> {
        let mut reader = Reader::new(data);
        let magic = reader.read_u16()?;
        ensure!(
            magic == MAGIC_NUMBER,
            Error::invalid_data(format!(
                "serialized stream must start with magic number {:X}; \
                 the data is corrupt or not an objpack envelope",
                MAGIC_NUMBER
            ))
        );
        let flags = reader.read_u8()?;
        ensure!(
            flags & format_flags::IS_LITTLE_ENDIAN_FLAG != 0,
            Error::invalid_data(
                "big-endian envelopes are not supported; \
                 ensure the producing machine is little endian"
            )
        );
        let num_opaque_segments = reader.read_varuint32()? as usize;
        let num_array_segments = reader.read_varuint32()? as usize;
        let num_raw_buffers = reader.read_varuint32()? as usize;
        ensure!(
            num_raw_buffers == 1 + num_opaque_segments + num_array_segments,
            Error::invalid_data(format!(
                "raw buffer count {} is inconsistent with {} opaque + {} array segments",
                num_raw_buffers, num_opaque_segments, num_array_segments
            ))
        );
        ensure!(
            num_raw_buffers <= reader.remaining() / 8,
            Error::invalid_data("buffer table exceeds the envelope length")
        );
        let mut lengths = Vec::with_capacity(num_raw_buffers);
        for _ in 0..num_raw_buffers {
            lengths.push(reader.read_u64()? as usize);
        }
        ensure!(
            reader.remaining() == lengths.iter().sum::<usize>(),
            Error::invalid_data("envelope length does not match its buffer table")
        );
        let meta = reader.read_shared(lengths[0])?;
        let mut payloads = Vec::with_capacity(num_raw_buffers - 1);
        for len in &lengths[1..] {
            payloads.push(reader.read_shared(*len)?);
        }
        Ok(SerializedEnvelope {
            meta,
            payloads,
            num_opaque_segments,
            num_array_segments,
        })
    }

    /// Deserializes this envelope, using the process-wide default registry
    /// when `context` is `None`.
    pub fn deserialize(&self, context: Option<&SerializationContext>) -> Result<Value, Error> {
        engine::with_context(context, |ctx| engine::decode_envelope(self, ctx))
    }
}

/// A sink that discards bytes and reports how many it was offered; backs the
/// dry-run mode of [`SerializedEnvelope::total_bytes`].
#[derive(Default)]
pub struct CountingSink {
    bytes: usize,
}

impl CountingSink {
    pub fn bytes_written(&self) -> usize {
        self.bytes
    }
}

impl io::Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
