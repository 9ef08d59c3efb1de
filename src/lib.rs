// Copyright 2023, The Android Open Source Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Client-side utilities for Neural Networks HAL drivers.
//!
//! A driver connection is an object reachable only through IPC, owned by a process that can
//! crash and restart at any time. This crate provides the pieces a client needs to keep using
//! such a connection safely:
//!
//! - [`driver`]: the capability traits ([`driver::Device`], [`driver::PreparedModel`],
//!   [`driver::Buffer`]) a connection must satisfy, independent of transport.
//! - [`resilient`]: wrappers that own a connection together with the factory that made it, and
//!   transparently reconnect and retry once when a call fails because the remote object died.
//! - [`invalid`]: always-failing stand-ins installed once a connection is known unrecoverable,
//!   so callers keep getting well-formed errors instead of a dangling remote reference.
//!
//! The resilient wrappers are drop-in substitutes for the raw connection: they implement the
//! same traits, so code written against [`driver::SharedDevice`] never needs to know whether
//! recovery is layered underneath.

pub mod driver;
pub mod error;
pub mod invalid;
pub mod resilient;
pub mod testing;
pub mod types;

pub use crate::error::{ErrorStatus, ExecutionError, ExecutionResult, GeneralError, GeneralResult};
pub use crate::invalid::{InvalidBuffer, InvalidDevice, InvalidPreparedModel};
pub use crate::resilient::{ResilientBuffer, ResilientDevice, ResilientPreparedModel};
