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

//! Wrappers that keep driver objects usable across a crash of the process backing them.
//!
//! [`ResilientDevice`] is the root of the scheme: it can actually reconnect, because a device is
//! found again by name. [`ResilientPreparedModel`] and [`ResilientBuffer`] cannot remake what
//! they wrap — a compiled model or an allocated buffer only comes back by re-running the owning
//! device's `prepare_model`/`allocate` — so they keep the same shape but hand failures straight
//! back to the caller.

mod buffer;
mod device;
mod prepared_model;

pub use buffer::ResilientBuffer;
pub use device::ResilientDevice;
pub use prepared_model::ResilientPreparedModel;
