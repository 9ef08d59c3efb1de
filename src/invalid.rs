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

//! Always-failing stand-ins for driver objects that are known unrecoverable.
//!
//! Once a connection is lost for good, one of these is installed in its place so that callers
//! holding a reference keep getting well-formed failures instead of reaching through a dangling
//! remote reference. Metadata accessors keep answering from values frozen at installation time;
//! every operational call fails with
//! [`ErrorStatus::GeneralFailure`](crate::error::ErrorStatus::GeneralFailure) and a message
//! naming the stand-in.

mod buffer;
mod device;
mod prepared_model;

pub use buffer::InvalidBuffer;
pub use device::InvalidDevice;
pub use prepared_model::InvalidPreparedModel;
