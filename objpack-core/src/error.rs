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

//! Error handling for serialization and deserialization.
//!
//! Error constructors sit on every buffer read and every registry lookup, so
//! they carry `#[cold]`/`#[track_caller]` to keep the hot paths tight. Always
//! construct errors through the static functions, never through the enum
//! variants directly.

use std::borrow::Cow;

use thiserror::Error;

/// Set OBJPACK_PANIC_ON_ERROR=1 at compile time to panic at the exact point
/// an error is created, with a full stack trace.
pub const PANIC_ON_ERROR: bool = option_env!("OBJPACK_PANIC_ON_ERROR").is_some();

/// Error type for all objpack serialization and deserialization operations.
///
/// Every error is fatal to the single serialize/deserialize call that raised
/// it; nothing is retried internally and no partial result is returned.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Serialize-time: no entry in the registry for any type in the object's
    /// lineage. Carries the offending type name and its `Debug` rendering.
    ///
    /// Do not construct directly; use [`Error::unknown_type`].
    #[error("no serializer registered for `{0}` (object: {1})")]
    UnknownType(Cow<'static, str>, String),

    /// Serialize-time: a generic-reflection candidate exposes neither
    /// reconstruction arguments nor a field view.
    ///
    /// Do not construct directly; use [`Error::unserializable`].
    #[error("{0}")]
    Unserializable(Cow<'static, str>),

    /// Deserialize-time: a payload references a type id absent from the
    /// reverse mapping of the context in use. Never raised for opaque-tagged
    /// segments.
    ///
    /// Do not construct directly; use [`Error::unregistered_type_id`].
    #[error("type id `{0}` is not registered in the deserialization context")]
    UnregisteredTypeId(String),

    /// Component counts inconsistent with the buffers supplied.
    ///
    /// Do not construct directly; use [`Error::invalid_components`].
    #[error("{0}")]
    InvalidComponents(Cow<'static, str>),

    /// Invalid or conflicting registration.
    ///
    /// Do not construct directly; use [`Error::configuration`].
    #[error("{0}")]
    Configuration(Cow<'static, str>),

    /// Invalid or corrupted wire data.
    ///
    /// Do not construct directly; use [`Error::invalid_data`].
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// An object reached a strategy it cannot satisfy, e.g. a subclass
    /// dispatched to an ancestor's typed codec.
    ///
    /// Do not construct directly; use [`Error::type_mismatch`].
    #[error("{0}")]
    TypeMismatch(Cow<'static, str>),

    /// Buffer boundary violation during read operations.
    ///
    /// Do not construct directly; use [`Error::buffer_out_of_bound`].
    #[error("buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// Failure in an external sink or source.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure in an external collaborator such as a pluggable blob codec.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a new [`Error::UnknownType`] from the offending type name and
    /// a debug rendering of the object.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_type<S: Into<Cow<'static, str>>>(type_name: S, object: String) -> Self {
        let err = Error::UnknownType(type_name.into(), object);
        if PANIC_ON_ERROR {
            panic!("OBJPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Unserializable`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unserializable<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::Unserializable(s.into());
        if PANIC_ON_ERROR {
            panic!("OBJPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::UnregisteredTypeId`] for the given wire type id.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unregistered_type_id<S: Into<String>>(type_id: S) -> Self {
        let err = Error::UnregisteredTypeId(type_id.into());
        if PANIC_ON_ERROR {
            panic!("OBJPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::InvalidComponents`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_components<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::InvalidComponents(s.into());
        if PANIC_ON_ERROR {
            panic!("OBJPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::Configuration`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn configuration<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::Configuration(s.into());
        if PANIC_ON_ERROR {
            panic!("OBJPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::InvalidData`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::InvalidData(s.into());
        if PANIC_ON_ERROR {
            panic!("OBJPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::TypeMismatch`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_mismatch<S: Into<Cow<'static, str>>>(s: S) -> Self {
        let err = Error::TypeMismatch(s.into());
        if PANIC_ON_ERROR {
            panic!("OBJPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("OBJPACK_PANIC_ON_ERROR: {}", err);
        }
        err
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// # Examples
/// ```
/// use objpack_core::ensure;
/// use objpack_core::error::Error;
///
/// fn check_len(n: usize) -> Result<(), Error> {
///     ensure!(n > 0, "length must be positive");
///     ensure!(n < 16, Error::invalid_data(format!("length {} too large", n)));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`enum@Error`].
///
/// # Examples
/// ```
/// use objpack_core::bail;
/// use objpack_core::error::Error;
///
/// fn fail_fast() -> Result<(), Error> {
///     bail!("corrupt stream");
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal) => {
        return Err($crate::error::Error::invalid_data($msg))
    };
    ($err:expr) => {
        return Err($err)
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}
