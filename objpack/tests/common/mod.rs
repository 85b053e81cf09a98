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

#![allow(dead_code)]

use std::any::Any;
use std::collections::BTreeMap;

use objpack::{Error, Parts, Reconstruct, Reflect, TypeKey, Value};

/// Fixed-field tuple-like record reconstructed positionally.
#[derive(Debug, PartialEq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Reflect for Point {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Point>()
    }

    fn reflect(&self) -> Result<Parts, Error> {
        Ok(Parts::Args(vec![Value::I64(self.x), Value::I64(self.y)]))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Reconstruct for Point {
    fn from_parts(parts: Parts) -> Result<Point, Error> {
        match parts {
            Parts::Args(args) => match args.as_slice() {
                [Value::I64(x), Value::I64(y)] => Ok(Point { x: *x, y: *y }),
                _ => Err(Error::invalid_data("point takes two integer arguments")),
            },
            _ => Err(Error::invalid_data("point reconstructs from arguments")),
        }
    }
}

/// Field-bag style record populated by name.
#[derive(Debug, PartialEq, Default)]
pub struct User {
    pub name: String,
    pub age: i64,
}

impl Reflect for User {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<User>()
    }

    fn reflect(&self) -> Result<Parts, Error> {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_owned(), Value::Str(self.name.clone()));
        fields.insert("age".to_owned(), Value::I64(self.age));
        Ok(Parts::Fields(fields))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Reconstruct for User {
    fn from_parts(parts: Parts) -> Result<User, Error> {
        let Parts::Fields(mut fields) = parts else {
            return Err(Error::invalid_data("user reconstructs from a field view"));
        };
        let mut user = User::default();
        if let Some(Value::Str(name)) = fields.remove("name") {
            user.name = name;
        }
        if let Some(Value::I64(age)) = fields.remove("age") {
            user.age = age;
        }
        Ok(user)
    }
}

/// Large payload carrier meant for the opaque-blob strategy.
#[derive(Debug, PartialEq)]
pub struct BigBlob {
    pub payload: Vec<u8>,
}

impl Reflect for BigBlob {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<BigBlob>()
    }

    fn reflect(&self) -> Result<Parts, Error> {
        Ok(Parts::Args(vec![Value::Bytes(self.payload.clone())]))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Reconstruct for BigBlob {
    fn from_parts(parts: Parts) -> Result<BigBlob, Error> {
        match parts {
            Parts::Args(args) => match args.into_iter().next() {
                Some(Value::Bytes(payload)) => Ok(BigBlob { payload }),
                _ => Err(Error::invalid_data("blob takes one byte-string argument")),
            },
            _ => Err(Error::invalid_data("blob reconstructs from arguments")),
        }
    }
}

/// Base type of a two-level lineage.
#[derive(Debug, PartialEq)]
pub struct Vehicle {
    pub wheels: i64,
}

impl Reflect for Vehicle {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Vehicle>()
    }

    fn reflect(&self) -> Result<Parts, Error> {
        Ok(Parts::Args(vec![Value::I64(self.wheels)]))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Reconstruct for Vehicle {
    fn from_parts(parts: Parts) -> Result<Vehicle, Error> {
        match parts {
            Parts::Args(args) => match args.as_slice() {
                [Value::I64(wheels)] => Ok(Vehicle { wheels: *wheels }),
                _ => Err(Error::invalid_data("vehicle takes one integer argument")),
            },
            _ => Err(Error::invalid_data("vehicle reconstructs from arguments")),
        }
    }
}

/// Subtype whose lineage names [`Vehicle`] as its ancestor. When only the
/// ancestor is registered, instances inherit its wire identity.
#[derive(Debug, PartialEq)]
pub struct Truck {
    pub wheels: i64,
}

impl Reflect for Truck {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Truck>()
    }

    fn lineage(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<Truck>(), TypeKey::of::<Vehicle>()]
    }

    fn reflect(&self) -> Result<Parts, Error> {
        Ok(Parts::Args(vec![Value::I64(self.wheels)]))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Reconstruct for Truck {
    fn from_parts(parts: Parts) -> Result<Truck, Error> {
        match parts {
            Parts::Args(args) => match args.as_slice() {
                [Value::I64(wheels)] => Ok(Truck { wheels: *wheels }),
                _ => Err(Error::invalid_data("truck takes one integer argument")),
            },
            _ => Err(Error::invalid_data("truck reconstructs from arguments")),
        }
    }
}

/// A type that opts out of reflection: it exposes neither reconstruction
/// arguments nor a field view.
#[derive(Debug)]
pub struct Sealed;

impl Reflect for Sealed {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Sealed>()
    }

    fn reflect(&self) -> Result<Parts, Error> {
        Err(Error::unserializable(
            "type exposes neither reconstruction arguments nor a field view",
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Reconstruct for Sealed {
    fn from_parts(_parts: Parts) -> Result<Sealed, Error> {
        Ok(Sealed)
    }
}
