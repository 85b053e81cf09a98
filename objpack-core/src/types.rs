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

//! Wire-level constants: the envelope header magic, format flags, and the
//! node/strategy tag bytes of the metadata stream.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Leading magic of every framed envelope stream.
pub const MAGIC_NUMBER: u16 = 0x6F70;

pub mod format_flags {
    /// Set when the producing host wrote multi-byte values little-endian.
    /// Always set by this implementation; validated on read.
    pub const IS_LITTLE_ENDIAN_FLAG: u8 = 0b0000_0001;
}

/// Tag byte identifying the kind of a node in the metadata stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum NodeKind {
    Null = 0,
    Bool = 1,
    I64 = 2,
    F64 = 3,
    Str = 4,
    Bytes = 5,
    Date = 6,
    Timestamp = 7,
    List = 8,
    Map = 9,
    /// Ordinal reference into the payload buffer table, or inline bytes when
    /// the node sits inside an opaque blob.
    Buffer = 10,
    /// Registry-tagged node carrying a [`StrategyTag`].
    Tagged = 11,
}

/// Tag byte identifying which reconstruction strategy a tagged node was
/// written with. `Args`/`Fields` double as the on-wire encoding of the two
/// reflection part variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum StrategyTag {
    Opaque = 0,
    Custom = 1,
    Args = 2,
    Fields = 3,
}
