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

//! Data types exchanged with a driver. Keep the discriminant values in sync with the HAL.

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::sync::Arc;
use std::time::Duration;

use num_derive::FromPrimitive;

/// The generation of the HAL interface a driver implements. Later levels are supersets of
/// earlier ones.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Ord, PartialEq, PartialOrd)]
#[repr(i32)]
pub enum FeatureLevel {
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    Level6 = 6,
    Level7 = 7,
    Level8 = 8,
}

/// The kind of hardware a driver runs on.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
#[repr(i32)]
pub enum DeviceType {
    /// The device does not fall into any other category.
    Other = 1,
    /// The device runs models on the CPU.
    Cpu = 2,
    /// The device can also accelerate graphics APIs.
    Gpu = 3,
    /// A dedicated accelerator for machine learning workloads.
    Accelerator = 4,
}

/// Operand type codes.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Hash, PartialEq)]
#[repr(i32)]
pub enum OperandType {
    Float32 = 0,
    Int32 = 1,
    UInt32 = 2,
    TensorFloat32 = 3,
    TensorInt32 = 4,
    TensorQuant8Asymm = 5,
    Bool = 6,
    TensorQuant16Symm = 7,
    TensorFloat16 = 8,
    TensorBool8 = 9,
    Float16 = 10,
    TensorQuant8SymmPerChannel = 11,
    TensorQuant16Asymm = 12,
    TensorQuant8Symm = 13,
    TensorQuant8AsymmSigned = 14,
}

/// Performance of an operation relative to running it on the CPU. Lower is better.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceInfo {
    /// Execution time ratio.
    pub exec_time: f32,
    /// Power usage ratio.
    pub power_usage: f32,
}

/// Performance of operations using a particular operand type.
#[derive(Clone, Debug, PartialEq)]
pub struct OperandPerformance {
    pub operand_type: OperandType,
    pub info: PerformanceInfo,
}

/// A driver's self-reported performance characteristics.
#[derive(Clone, Debug, PartialEq)]
pub struct Capabilities {
    /// Performance of scalar float32 operations when relaxed to float16 precision.
    pub relaxed_float32_to_float16_performance_scalar: PerformanceInfo,
    /// Performance of tensor float32 operations when relaxed to float16 precision.
    pub relaxed_float32_to_float16_performance_tensor: PerformanceInfo,
    /// Per-operand-type performance, sorted by operand type.
    pub operand_performance: Vec<OperandPerformance>,
    /// Performance of IF control flow.
    pub if_performance: PerformanceInfo,
    /// Performance of WHILE control flow.
    pub while_performance: PerformanceInfo,
}

/// An operand type defined by a vendor extension rather than the HAL itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtensionOperandTypeInformation {
    /// The type code within the extension's namespace.
    pub operand_type: u16,
    /// Whether the type is a tensor or a scalar.
    pub is_tensor: bool,
    /// Size of a scalar value, or of a single tensor element, in bytes.
    pub byte_size: u32,
}

/// A vendor extension a driver supports.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Extension {
    /// Reverse-domain-name identifier of the extension.
    pub name: String,
    /// Operand types the extension defines.
    pub operand_types: Vec<ExtensionOperandTypeInformation>,
}

/// An operand of a model. The semantics of its contents are the driver's business; this crate
/// only carries them across.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operand {
    pub operand_type: OperandType,
    pub dimensions: Vec<u32>,
}

/// An operation of a model, referring to its operands by index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation {
    pub opcode: u32,
    pub inputs: Vec<u32>,
    pub outputs: Vec<u32>,
}

/// A model to be compiled by a driver.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Model {
    pub operands: Vec<Operand>,
    pub operations: Vec<Operation>,
}

/// A memory pool shared with a driver. The mapping itself lives in the driver process; clients
/// refer to the pool by name and size only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
    pub name: String,
    pub size: u64,
}

/// Shared-ownership reference to a memory pool.
pub type SharedMemory = Arc<Memory>;

/// A region within one of a request's memory pools.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DataLocation {
    pub pool_index: u32,
    pub offset: u32,
    pub length: u32,
}

/// One input or output of an execution.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestArgument {
    /// An omitted optional argument carries no value and an empty location.
    pub has_no_value: bool,
    pub location: DataLocation,
    pub dimensions: Vec<u32>,
}

/// The inputs and outputs of one execution.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Request {
    pub inputs: Vec<RequestArgument>,
    pub outputs: Vec<RequestArgument>,
    pub pools: Vec<SharedMemory>,
}

/// The shape of an output operand after an execution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputShape {
    pub dimensions: Vec<u32>,
    /// Whether the buffer the caller provided was large enough for this output.
    pub is_sufficient: bool,
}

/// Durations a driver reports for one execution, when timing was requested and the driver
/// measured it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Timing {
    /// Time spent on the compute device, excluding driver overhead.
    pub time_on_device: Option<Duration>,
    /// Time spent in the driver, including time on the compute device.
    pub time_in_driver: Option<Duration>,
}

/// What the caller wants a compilation optimized for.
#[derive(Clone, Copy, Debug, Default, Eq, FromPrimitive, PartialEq)]
#[repr(i32)]
pub enum ExecutionPreference {
    /// Minimize battery drain.
    LowPower = 0,
    /// Return a single answer as fast as possible, even at the cost of more power.
    #[default]
    FastSingleAnswer = 1,
    /// Maximize sustained throughput of successive frames.
    SustainedSpeed = 2,
}

/// Scheduling priority of a compiled model relative to the caller's other models.
#[derive(Clone, Copy, Debug, Default, Eq, FromPrimitive, PartialEq)]
#[repr(i32)]
pub enum Priority {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
}

/// Number of bytes in a compilation cache token.
pub const CACHE_TOKEN_LENGTH: usize = 32;

/// Token identifying a compilation to the driver's on-disk cache.
pub type CacheToken = [u8; CACHE_TOKEN_LENGTH];

/// Identifier a driver assigns to a buffer it allocated, for referencing the buffer in requests.
/// Zero is never a valid token.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct MemoryDomainToken(pub u32);

/// A synchronization fence the driver signals when fenced work completes. Wraps the underlying
/// sync file descriptor.
#[derive(Debug)]
pub struct SyncFence(OwnedFd);

impl SyncFence {
    /// Takes ownership of a sync file descriptor.
    pub fn new(fd: OwnedFd) -> Self {
        Self(fd)
    }
}

impl AsFd for SyncFence {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

/// Properties of a driver-allocated buffer.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BufferDesc {
    pub dimensions: Vec<u32>,
}

/// How an allocated buffer will be used with one prepared model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferRole {
    /// Index into the prepared models passed to `allocate`.
    pub model_index: u32,
    /// Index of the input or output within that model.
    pub io_index: u32,
    /// Estimated fraction of uses that will be with this role, in (0.0, 1.0].
    pub probability: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn feature_levels_are_ordered() {
        assert!(FeatureLevel::Level1 < FeatureLevel::Level5);
        assert!(FeatureLevel::Level7 < FeatureLevel::Level8);
    }

    #[test]
    fn enums_convert_from_raw_codes() {
        assert_eq!(FeatureLevel::from_i32(5), Some(FeatureLevel::Level5));
        assert_eq!(FeatureLevel::from_i32(0), None);
        assert_eq!(DeviceType::from_i32(4), Some(DeviceType::Accelerator));
        assert_eq!(DeviceType::from_i32(5), None);
        assert_eq!(OperandType::from_i32(3), Some(OperandType::TensorFloat32));
        assert_eq!(OperandType::from_i32(15), None);
    }

    #[test]
    fn defaults_match_hal_defaults() {
        assert_eq!(ExecutionPreference::default(), ExecutionPreference::FastSingleAnswer);
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(MemoryDomainToken::default(), MemoryDomainToken(0));
    }
}
