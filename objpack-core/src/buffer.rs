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

//! Little-endian binary buffer management.
//!
//! [`Writer`] appends into a growable byte vector; [`Reader`] walks a
//! refcounted [`Bytes`] region with bounds-checked reads, so sub-ranges can
//! be handed out without copying and keep the backing storage alive.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use bytes::Bytes;

use crate::error::Error;

#[derive(Default)]
pub struct Writer {
    bf: Vec<u8>,
    reserved: usize,
}

impl Writer {
    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.reserved += additional;
        if self.bf.capacity() < self.reserved {
            self.bf.reserve(self.reserved);
        }
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.bf)
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.bf.extend_from_slice(v);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bf.write_u8(value).unwrap();
    }

    pub fn write_u16(&mut self, value: u16) {
        self.bf.write_u16::<LittleEndian>(value).unwrap();
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bf.write_u32::<LittleEndian>(value).unwrap();
    }

    pub fn write_i32(&mut self, value: i32) {
        self.bf.write_i32::<LittleEndian>(value).unwrap();
    }

    pub fn write_u64(&mut self, value: u64) {
        self.bf.write_u64::<LittleEndian>(value).unwrap();
    }

    pub fn write_i64(&mut self, value: i64) {
        self.bf.write_i64::<LittleEndian>(value).unwrap();
    }

    pub fn write_f64(&mut self, value: f64) {
        self.bf.write_f64::<LittleEndian>(value).unwrap();
    }

    pub fn write_varuint32(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.write_u8(((value as u8) & 0x7F) | 0x80);
            value >>= 7;
        }
        self.write_u8(value as u8);
    }

    pub fn write_varint32(&mut self, value: i32) {
        let zigzag = ((value as i64) << 1) ^ ((value as i64) >> 31);
        self.write_varuint32(zigzag as u32)
    }

    pub fn write_varuint64(&mut self, mut value: u64) {
        // up to eight 7-bit groups; a ninth full byte carries the rest
        for _ in 0..8 {
            if value < 0x80 {
                self.write_u8(value as u8);
                return;
            }
            self.write_u8(((value as u8) & 0x7F) | 0x80);
            value >>= 7;
        }
        self.write_u8(value as u8);
    }

    pub fn write_varint64(&mut self, value: i64) {
        let zigzag = ((value << 1) ^ (value >> 63)) as u64;
        self.write_varuint64(zigzag)
    }

    /// Length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) {
        self.write_varuint32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }
}

pub struct Reader {
    data: Bytes,
    cursor: usize,
}

impl Reader {
    pub fn new(data: Bytes) -> Reader {
        Reader { data, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    #[inline]
    fn check(&self, additional: usize) -> Result<(), Error> {
        if self.cursor + additional > self.data.len() {
            return Err(Error::buffer_out_of_bound(
                self.cursor,
                additional,
                self.data.len(),
            ));
        }
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.check(len)?;
        self.cursor += len;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.check(1)?;
        let result = self.data[self.cursor];
        self.cursor += 1;
        Ok(result)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        self.check(2)?;
        let result = LittleEndian::read_u16(&self.data[self.cursor..]);
        self.cursor += 2;
        Ok(result)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        self.check(4)?;
        let result = LittleEndian::read_u32(&self.data[self.cursor..]);
        self.cursor += 4;
        Ok(result)
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        self.check(4)?;
        let result = LittleEndian::read_i32(&self.data[self.cursor..]);
        self.cursor += 4;
        Ok(result)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.check(8)?;
        let result = LittleEndian::read_u64(&self.data[self.cursor..]);
        self.cursor += 8;
        Ok(result)
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        self.check(8)?;
        let result = LittleEndian::read_i64(&self.data[self.cursor..]);
        self.cursor += 8;
        Ok(result)
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        self.check(8)?;
        let result = LittleEndian::read_f64(&self.data[self.cursor..]);
        self.cursor += 8;
        Ok(result)
    }

    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        let mut encoded = 0u32;
        for shift in (0..).step_by(7).take(5) {
            let b = self.read_u8()?;
            encoded |= ((b & 0x7F) as u32) << shift;
            if b < 0x80 {
                return Ok(encoded);
            }
        }
        Err(Error::invalid_data("varuint32 exceeds five bytes"))
    }

    pub fn read_varint32(&mut self) -> Result<i32, Error> {
        let encoded = self.read_varuint32()?;
        Ok(((encoded >> 1) as i32) ^ -((encoded & 1) as i32))
    }

    pub fn read_varuint64(&mut self) -> Result<u64, Error> {
        let mut encoded = 0u64;
        for group in 0..8 {
            let b = self.read_u8()?;
            encoded |= ((b & 0x7F) as u64) << (7 * group);
            if b < 0x80 {
                return Ok(encoded);
            }
        }
        let b = self.read_u8()?;
        Ok(encoded | ((b as u64) << 56))
    }

    pub fn read_varint64(&mut self) -> Result<i64, Error> {
        let encoded = self.read_varuint64()?;
        Ok(((encoded >> 1) as i64) ^ -((encoded & 1) as i64))
    }

    /// Borrowed view of the next `len` bytes.
    pub fn read_slice(&mut self, len: usize) -> Result<&[u8], Error> {
        self.check(len)?;
        let s = &self.data[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(s)
    }

    /// Refcounted view of the next `len` bytes; shares the backing storage
    /// instead of copying.
    pub fn read_shared(&mut self, len: usize) -> Result<Bytes, Error> {
        self.check(len)?;
        let s = self.data.slice(self.cursor..self.cursor + len);
        self.cursor += len;
        Ok(s)
    }

    /// Length-prefixed UTF-8 string, inverse of [`Writer::write_str`].
    pub fn read_str(&mut self) -> Result<String, Error> {
        let len = self.read_varuint32()? as usize;
        let bytes = self.read_slice(len)?;
        std::str::from_utf8(bytes)
            .map(|s| s.to_owned())
            .map_err(|_| Error::invalid_data("string payload is not valid UTF-8"))
    }
}
