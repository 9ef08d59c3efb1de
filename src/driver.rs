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

//! Capability traits a driver connection must satisfy, independent of transport.
//!
//! The objects behind these traits are typically stubs for a remote process, so any method may
//! fail with [`ErrorStatus::DeadObject`](crate::error::ErrorStatus::DeadObject) when that
//! process has terminated. Infallible accessors report values the implementation is expected to
//! have captured up front.

use std::fs::File;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ExecutionResult, GeneralResult};
use crate::types::{
    BufferDesc, BufferRole, CacheToken, Capabilities, DeviceType, ExecutionPreference, Extension,
    FeatureLevel, MemoryDomainToken, Model, OutputShape, Priority, Request, SharedMemory,
    SyncFence, Timing,
};

/// Shared-ownership reference to a driver connection.
pub type SharedDevice = Arc<dyn Device>;

/// Shared-ownership reference to a compiled model.
pub type SharedPreparedModel = Arc<dyn PreparedModel>;

/// Shared-ownership reference to a driver-allocated buffer.
pub type SharedBuffer = Arc<dyn Buffer>;

/// Shared-ownership reference to a reusable execution.
pub type SharedExecution = Arc<dyn Execution>;

/// Shared-ownership reference to an execution burst.
pub type SharedBurst = Arc<dyn Burst>;

/// An open compilation cache file.
pub type SharedCacheFile = Arc<File>;

/// Makes a fresh connection to a driver. The flag says whether the factory may block waiting
/// for the driver's service to become available; when it is false and the service is not ready,
/// the factory must return an error immediately.
pub type DeviceFactory = Box<dyn Fn(bool) -> GeneralResult<SharedDevice> + Send + Sync>;

/// Makes a fresh prepared model, typically by re-running a compilation.
pub type PreparedModelFactory = Box<dyn Fn() -> GeneralResult<SharedPreparedModel> + Send + Sync>;

/// Makes a fresh driver-allocated buffer.
pub type BufferFactory = Box<dyn Fn() -> GeneralResult<SharedBuffer> + Send + Sync>;

/// A connection to an accelerator driver.
pub trait Device: Send + Sync {
    /// The name the driver registered under. Stable across driver restarts.
    fn name(&self) -> &str;

    /// The driver's version string. Changes only when the driver is updated.
    fn version_string(&self) -> &str;

    /// The HAL generation the driver implements.
    fn feature_level(&self) -> FeatureLevel;

    /// The kind of hardware the driver runs on.
    fn device_type(&self) -> DeviceType;

    /// Vendor extensions the driver supports.
    fn supported_extensions(&self) -> &[Extension];

    /// The driver's performance characteristics.
    fn capabilities(&self) -> &Capabilities;

    /// How many (model cache, data cache) files the driver needs for compilation caching.
    fn number_of_cache_files_needed(&self) -> (u32, u32);

    /// Blocks until the driver is ready to take on work, or fails if it cannot become ready.
    fn wait(&self) -> GeneralResult<()>;

    /// Reports, per operation of `model`, whether the driver can execute it.
    fn supported_operations(&self, model: &Model) -> GeneralResult<Vec<bool>>;

    /// Compiles `model` for execution on this device.
    ///
    /// `model_cache` and `data_cache` are open cache files the driver may fill so that a later
    /// [`Device::prepare_model_from_cache`] with the same `token` can skip the compilation.
    #[allow(clippy::too_many_arguments)]
    fn prepare_model(
        &self,
        model: &Model,
        preference: ExecutionPreference,
        priority: Priority,
        deadline: Option<Instant>,
        model_cache: &[SharedCacheFile],
        data_cache: &[SharedCacheFile],
        token: CacheToken,
    ) -> GeneralResult<SharedPreparedModel>;

    /// Recreates a prepared model from cache files written by an earlier compilation.
    fn prepare_model_from_cache(
        &self,
        deadline: Option<Instant>,
        model_cache: &[SharedCacheFile],
        data_cache: &[SharedCacheFile],
        token: CacheToken,
    ) -> GeneralResult<SharedPreparedModel>;

    /// Allocates a driver-managed buffer for use with the given prepared models.
    fn allocate(
        &self,
        desc: &BufferDesc,
        prepared_models: &[SharedPreparedModel],
        input_roles: &[BufferRole],
        output_roles: &[BufferRole],
    ) -> GeneralResult<SharedBuffer>;
}

/// A model compiled for a particular device.
pub trait PreparedModel: Send + Sync {
    /// Runs the model synchronously and returns the output shapes and, when `measure` is set,
    /// the measured timing.
    fn execute(
        &self,
        request: &Request,
        measure: bool,
        deadline: Option<Instant>,
        loop_timeout: Option<Duration>,
    ) -> ExecutionResult<(Vec<OutputShape>, Timing)>;

    /// Starts the model after the `wait_for` fences signal and returns a fence that signals on
    /// completion, or `None` when the execution already completed synchronously.
    #[allow(clippy::too_many_arguments)]
    fn execute_fenced(
        &self,
        request: &Request,
        wait_for: &[SyncFence],
        measure: bool,
        deadline: Option<Instant>,
        loop_timeout: Option<Duration>,
        timeout_after_fence: Option<Duration>,
    ) -> GeneralResult<Option<SyncFence>>;

    /// Creates an execution that can be computed repeatedly with the same request.
    fn create_reusable_execution(
        &self,
        request: &Request,
        measure: bool,
        loop_timeout: Option<Duration>,
    ) -> GeneralResult<SharedExecution>;

    /// Creates a burst, which executes with lower overhead in exchange for the caller promising
    /// serialized use.
    fn configure_execution_burst(&self) -> GeneralResult<SharedBurst>;
}

/// A driver-managed buffer usable as an execution input or output.
pub trait Buffer: Send + Sync {
    /// The token identifying this buffer in requests. Never zero for a live buffer.
    fn token(&self) -> MemoryDomainToken;

    /// Copies the buffer's contents into `dst`.
    fn copy_to(&self, dst: &SharedMemory) -> GeneralResult<()>;

    /// Replaces the buffer's contents with those of `src`, reshaped to `dimensions`.
    fn copy_from(&self, src: &SharedMemory, dimensions: &[u32]) -> GeneralResult<()>;
}

/// An execution bound to one request, computable any number of times.
pub trait Execution: Send + Sync {
    /// Computes the execution synchronously.
    fn compute(&self, deadline: Option<Instant>) -> ExecutionResult<(Vec<OutputShape>, Timing)>;

    /// Computes the execution after the `wait_for` fences signal; `None` means it already
    /// completed synchronously.
    fn compute_fenced(
        &self,
        wait_for: &[SyncFence],
        deadline: Option<Instant>,
        timeout_after_fence: Option<Duration>,
    ) -> GeneralResult<Option<SyncFence>>;
}

/// A burst context for rapid sequences of executions on one prepared model.
pub trait Burst: Send + Sync {
    /// Runs the model through the burst.
    fn execute(
        &self,
        request: &Request,
        measure: bool,
        deadline: Option<Instant>,
        loop_timeout: Option<Duration>,
    ) -> ExecutionResult<(Vec<OutputShape>, Timing)>;

    /// Creates a reusable execution that computes through the burst.
    fn create_reusable_execution(
        &self,
        request: &Request,
        measure: bool,
        loop_timeout: Option<Duration>,
    ) -> GeneralResult<SharedExecution>;
}
