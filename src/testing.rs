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

//! Scriptable in-process test doubles for the driver interfaces.
//!
//! Each mock answers metadata queries from the values it was built with and serves operational
//! calls from a queue of scripted results, panicking on a call nothing was scripted for. These
//! are for tests only; the panics are deliberate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::driver::{
    Buffer, Burst, Device, DeviceFactory, Execution, PreparedModel, SharedBuffer, SharedBurst,
    SharedCacheFile, SharedDevice, SharedExecution, SharedPreparedModel,
};
use crate::error::{ExecutionResult, GeneralResult};
use crate::types::{
    BufferDesc, BufferRole, CacheToken, Capabilities, DeviceType, ExecutionPreference, Extension,
    FeatureLevel, MemoryDomainToken, Model, OutputShape, PerformanceInfo, Priority, Request,
    SharedMemory, SyncFence, Timing,
};

/// The capability table mock devices report by default: no performance information.
pub fn test_capabilities() -> Capabilities {
    let no_info = PerformanceInfo { exec_time: f32::MAX, power_usage: f32::MAX };
    Capabilities {
        relaxed_float32_to_float16_performance_scalar: no_info,
        relaxed_float32_to_float16_performance_tensor: no_info,
        operand_performance: Vec::new(),
        if_performance: no_info,
        while_performance: no_info,
    }
}

/// The extension list mock devices report by default: none.
pub fn test_extensions() -> Vec<Extension> {
    Vec::new()
}

/// Whether two shared objects are the same allocation, regardless of how they are typed.
pub fn same_object<T: ?Sized, U: ?Sized>(a: &Arc<T>, b: &Arc<U>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

fn pop<T>(queue: &Mutex<VecDeque<T>>, operation: &str) -> T {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("unexpected call to {}", operation))
}

/// Per-accessor call counts of a [`MockDevice`]'s metadata methods.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MetadataCalls {
    pub name: usize,
    pub version_string: usize,
    pub feature_level: usize,
    pub device_type: usize,
    pub supported_extensions: usize,
    pub capabilities: usize,
    pub number_of_cache_files_needed: usize,
}

/// A scripted [`Device`].
pub struct MockDevice {
    name: String,
    version_string: String,
    feature_level: FeatureLevel,
    device_type: DeviceType,
    extensions: Vec<Extension>,
    capabilities: Capabilities,
    cache_files_needed: (u32, u32),
    name_calls: AtomicUsize,
    version_string_calls: AtomicUsize,
    feature_level_calls: AtomicUsize,
    device_type_calls: AtomicUsize,
    supported_extensions_calls: AtomicUsize,
    capabilities_calls: AtomicUsize,
    cache_files_needed_calls: AtomicUsize,
    wait_results: Mutex<VecDeque<GeneralResult<()>>>,
    supported_operations_results: Mutex<VecDeque<GeneralResult<Vec<bool>>>>,
    prepare_model_results: Mutex<VecDeque<GeneralResult<SharedPreparedModel>>>,
    prepare_model_from_cache_results: Mutex<VecDeque<GeneralResult<SharedPreparedModel>>>,
    allocate_results: Mutex<VecDeque<GeneralResult<SharedBuffer>>>,
}

impl MockDevice {
    /// Creates a mock reporting the given name and a fixed set of default metadata.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version_string: "version1".to_string(),
            feature_level: FeatureLevel::Level5,
            device_type: DeviceType::Accelerator,
            extensions: test_extensions(),
            capabilities: test_capabilities(),
            cache_files_needed: (5, 3),
            name_calls: AtomicUsize::new(0),
            version_string_calls: AtomicUsize::new(0),
            feature_level_calls: AtomicUsize::new(0),
            device_type_calls: AtomicUsize::new(0),
            supported_extensions_calls: AtomicUsize::new(0),
            capabilities_calls: AtomicUsize::new(0),
            cache_files_needed_calls: AtomicUsize::new(0),
            wait_results: Mutex::new(VecDeque::new()),
            supported_operations_results: Mutex::new(VecDeque::new()),
            prepare_model_results: Mutex::new(VecDeque::new()),
            prepare_model_from_cache_results: Mutex::new(VecDeque::new()),
            allocate_results: Mutex::new(VecDeque::new()),
        }
    }

    /// Overrides the reported version string.
    pub fn with_version_string(mut self, version_string: &str) -> Self {
        self.version_string = version_string.to_string();
        self
    }

    /// Overrides the reported feature level.
    pub fn with_feature_level(mut self, feature_level: FeatureLevel) -> Self {
        self.feature_level = feature_level;
        self
    }

    /// Overrides the reported device type.
    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    /// Overrides the reported extensions.
    pub fn with_extensions(mut self, extensions: Vec<Extension>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Overrides the reported capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Scripts the result of the next unscripted `wait` call.
    pub fn expect_wait(&self, result: GeneralResult<()>) {
        self.wait_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `supported_operations` call.
    pub fn expect_supported_operations(&self, result: GeneralResult<Vec<bool>>) {
        self.supported_operations_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `prepare_model` call.
    pub fn expect_prepare_model(&self, result: GeneralResult<SharedPreparedModel>) {
        self.prepare_model_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `prepare_model_from_cache` call.
    pub fn expect_prepare_model_from_cache(&self, result: GeneralResult<SharedPreparedModel>) {
        self.prepare_model_from_cache_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `allocate` call.
    pub fn expect_allocate(&self, result: GeneralResult<SharedBuffer>) {
        self.allocate_results.lock().unwrap().push_back(result);
    }

    /// Snapshots how many times each metadata accessor has been called.
    pub fn metadata_calls(&self) -> MetadataCalls {
        MetadataCalls {
            name: self.name_calls.load(Ordering::Relaxed),
            version_string: self.version_string_calls.load(Ordering::Relaxed),
            feature_level: self.feature_level_calls.load(Ordering::Relaxed),
            device_type: self.device_type_calls.load(Ordering::Relaxed),
            supported_extensions: self.supported_extensions_calls.load(Ordering::Relaxed),
            capabilities: self.capabilities_calls.load(Ordering::Relaxed),
            number_of_cache_files_needed: self.cache_files_needed_calls.load(Ordering::Relaxed),
        }
    }
}

impl Device for MockDevice {
    fn name(&self) -> &str {
        self.name_calls.fetch_add(1, Ordering::Relaxed);
        &self.name
    }

    fn version_string(&self) -> &str {
        self.version_string_calls.fetch_add(1, Ordering::Relaxed);
        &self.version_string
    }

    fn feature_level(&self) -> FeatureLevel {
        self.feature_level_calls.fetch_add(1, Ordering::Relaxed);
        self.feature_level
    }

    fn device_type(&self) -> DeviceType {
        self.device_type_calls.fetch_add(1, Ordering::Relaxed);
        self.device_type
    }

    fn supported_extensions(&self) -> &[Extension] {
        self.supported_extensions_calls.fetch_add(1, Ordering::Relaxed);
        &self.extensions
    }

    fn capabilities(&self) -> &Capabilities {
        self.capabilities_calls.fetch_add(1, Ordering::Relaxed);
        &self.capabilities
    }

    fn number_of_cache_files_needed(&self) -> (u32, u32) {
        self.cache_files_needed_calls.fetch_add(1, Ordering::Relaxed);
        self.cache_files_needed
    }

    fn wait(&self) -> GeneralResult<()> {
        pop(&self.wait_results, "MockDevice::wait")
    }

    fn supported_operations(&self, _model: &Model) -> GeneralResult<Vec<bool>> {
        pop(&self.supported_operations_results, "MockDevice::supported_operations")
    }

    fn prepare_model(
        &self,
        _model: &Model,
        _preference: ExecutionPreference,
        _priority: Priority,
        _deadline: Option<Instant>,
        _model_cache: &[SharedCacheFile],
        _data_cache: &[SharedCacheFile],
        _token: CacheToken,
    ) -> GeneralResult<SharedPreparedModel> {
        pop(&self.prepare_model_results, "MockDevice::prepare_model")
    }

    fn prepare_model_from_cache(
        &self,
        _deadline: Option<Instant>,
        _model_cache: &[SharedCacheFile],
        _data_cache: &[SharedCacheFile],
        _token: CacheToken,
    ) -> GeneralResult<SharedPreparedModel> {
        pop(&self.prepare_model_from_cache_results, "MockDevice::prepare_model_from_cache")
    }

    fn allocate(
        &self,
        _desc: &BufferDesc,
        _prepared_models: &[SharedPreparedModel],
        _input_roles: &[BufferRole],
        _output_roles: &[BufferRole],
    ) -> GeneralResult<SharedBuffer> {
        pop(&self.allocate_results, "MockDevice::allocate")
    }
}

/// A scripted [`PreparedModel`].
pub struct MockPreparedModel {
    execute_results: Mutex<VecDeque<ExecutionResult<(Vec<OutputShape>, Timing)>>>,
    execute_fenced_results: Mutex<VecDeque<GeneralResult<Option<SyncFence>>>>,
    create_reusable_execution_results: Mutex<VecDeque<GeneralResult<SharedExecution>>>,
    configure_execution_burst_results: Mutex<VecDeque<GeneralResult<SharedBurst>>>,
}

impl MockPreparedModel {
    pub fn new() -> Self {
        Self {
            execute_results: Mutex::new(VecDeque::new()),
            execute_fenced_results: Mutex::new(VecDeque::new()),
            create_reusable_execution_results: Mutex::new(VecDeque::new()),
            configure_execution_burst_results: Mutex::new(VecDeque::new()),
        }
    }

    /// Scripts the result of the next `execute` call.
    pub fn expect_execute(&self, result: ExecutionResult<(Vec<OutputShape>, Timing)>) {
        self.execute_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `execute_fenced` call.
    pub fn expect_execute_fenced(&self, result: GeneralResult<Option<SyncFence>>) {
        self.execute_fenced_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `create_reusable_execution` call.
    pub fn expect_create_reusable_execution(&self, result: GeneralResult<SharedExecution>) {
        self.create_reusable_execution_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `configure_execution_burst` call.
    pub fn expect_configure_execution_burst(&self, result: GeneralResult<SharedBurst>) {
        self.configure_execution_burst_results.lock().unwrap().push_back(result);
    }
}

impl Default for MockPreparedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PreparedModel for MockPreparedModel {
    fn execute(
        &self,
        _request: &Request,
        _measure: bool,
        _deadline: Option<Instant>,
        _loop_timeout: Option<Duration>,
    ) -> ExecutionResult<(Vec<OutputShape>, Timing)> {
        pop(&self.execute_results, "MockPreparedModel::execute")
    }

    fn execute_fenced(
        &self,
        _request: &Request,
        _wait_for: &[SyncFence],
        _measure: bool,
        _deadline: Option<Instant>,
        _loop_timeout: Option<Duration>,
        _timeout_after_fence: Option<Duration>,
    ) -> GeneralResult<Option<SyncFence>> {
        pop(&self.execute_fenced_results, "MockPreparedModel::execute_fenced")
    }

    fn create_reusable_execution(
        &self,
        _request: &Request,
        _measure: bool,
        _loop_timeout: Option<Duration>,
    ) -> GeneralResult<SharedExecution> {
        pop(&self.create_reusable_execution_results, "MockPreparedModel::create_reusable_execution")
    }

    fn configure_execution_burst(&self) -> GeneralResult<SharedBurst> {
        pop(&self.configure_execution_burst_results, "MockPreparedModel::configure_execution_burst")
    }
}

/// A scripted [`Buffer`] with a fixed token.
pub struct MockBuffer {
    token: MemoryDomainToken,
    copy_to_results: Mutex<VecDeque<GeneralResult<()>>>,
    copy_from_results: Mutex<VecDeque<GeneralResult<()>>>,
}

impl MockBuffer {
    pub fn new(token: MemoryDomainToken) -> Self {
        Self {
            token,
            copy_to_results: Mutex::new(VecDeque::new()),
            copy_from_results: Mutex::new(VecDeque::new()),
        }
    }

    /// Scripts the result of the next `copy_to` call.
    pub fn expect_copy_to(&self, result: GeneralResult<()>) {
        self.copy_to_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `copy_from` call.
    pub fn expect_copy_from(&self, result: GeneralResult<()>) {
        self.copy_from_results.lock().unwrap().push_back(result);
    }
}

impl Buffer for MockBuffer {
    fn token(&self) -> MemoryDomainToken {
        self.token
    }

    fn copy_to(&self, _dst: &SharedMemory) -> GeneralResult<()> {
        pop(&self.copy_to_results, "MockBuffer::copy_to")
    }

    fn copy_from(&self, _src: &SharedMemory, _dimensions: &[u32]) -> GeneralResult<()> {
        pop(&self.copy_from_results, "MockBuffer::copy_from")
    }
}

/// A scripted [`Execution`].
pub struct MockExecution {
    compute_results: Mutex<VecDeque<ExecutionResult<(Vec<OutputShape>, Timing)>>>,
    compute_fenced_results: Mutex<VecDeque<GeneralResult<Option<SyncFence>>>>,
}

impl MockExecution {
    pub fn new() -> Self {
        Self {
            compute_results: Mutex::new(VecDeque::new()),
            compute_fenced_results: Mutex::new(VecDeque::new()),
        }
    }

    /// Scripts the result of the next `compute` call.
    pub fn expect_compute(&self, result: ExecutionResult<(Vec<OutputShape>, Timing)>) {
        self.compute_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `compute_fenced` call.
    pub fn expect_compute_fenced(&self, result: GeneralResult<Option<SyncFence>>) {
        self.compute_fenced_results.lock().unwrap().push_back(result);
    }
}

impl Default for MockExecution {
    fn default() -> Self {
        Self::new()
    }
}

impl Execution for MockExecution {
    fn compute(&self, _deadline: Option<Instant>) -> ExecutionResult<(Vec<OutputShape>, Timing)> {
        pop(&self.compute_results, "MockExecution::compute")
    }

    fn compute_fenced(
        &self,
        _wait_for: &[SyncFence],
        _deadline: Option<Instant>,
        _timeout_after_fence: Option<Duration>,
    ) -> GeneralResult<Option<SyncFence>> {
        pop(&self.compute_fenced_results, "MockExecution::compute_fenced")
    }
}

/// A scripted [`Burst`].
pub struct MockBurst {
    execute_results: Mutex<VecDeque<ExecutionResult<(Vec<OutputShape>, Timing)>>>,
    create_reusable_execution_results: Mutex<VecDeque<GeneralResult<SharedExecution>>>,
}

impl MockBurst {
    pub fn new() -> Self {
        Self {
            execute_results: Mutex::new(VecDeque::new()),
            create_reusable_execution_results: Mutex::new(VecDeque::new()),
        }
    }

    /// Scripts the result of the next `execute` call.
    pub fn expect_execute(&self, result: ExecutionResult<(Vec<OutputShape>, Timing)>) {
        self.execute_results.lock().unwrap().push_back(result);
    }

    /// Scripts the result of the next `create_reusable_execution` call.
    pub fn expect_create_reusable_execution(&self, result: GeneralResult<SharedExecution>) {
        self.create_reusable_execution_results.lock().unwrap().push_back(result);
    }
}

impl Default for MockBurst {
    fn default() -> Self {
        Self::new()
    }
}

impl Burst for MockBurst {
    fn execute(
        &self,
        _request: &Request,
        _measure: bool,
        _deadline: Option<Instant>,
        _loop_timeout: Option<Duration>,
    ) -> ExecutionResult<(Vec<OutputShape>, Timing)> {
        pop(&self.execute_results, "MockBurst::execute")
    }

    fn create_reusable_execution(
        &self,
        _request: &Request,
        _measure: bool,
        _loop_timeout: Option<Duration>,
    ) -> GeneralResult<SharedExecution> {
        pop(&self.create_reusable_execution_results, "MockBurst::create_reusable_execution")
    }
}

/// A scripted device factory that records the blocking flag of every call.
pub struct MockDeviceFactory {
    results: Mutex<VecDeque<GeneralResult<SharedDevice>>>,
    calls: Mutex<Vec<bool>>,
}

impl MockDeviceFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { results: Mutex::new(VecDeque::new()), calls: Mutex::new(Vec::new()) })
    }

    /// Scripts the result of the next factory call.
    pub fn expect(&self, result: GeneralResult<SharedDevice>) {
        self.results.lock().unwrap().push_back(result);
    }

    /// The blocking flags of the calls made so far, in order.
    pub fn calls(&self) -> Vec<bool> {
        self.calls.lock().unwrap().clone()
    }

    /// Wraps this recorder in a [`DeviceFactory`] closure.
    pub fn as_factory(self: &Arc<Self>) -> DeviceFactory {
        let factory = self.clone();
        Box::new(move |blocking| {
            factory.calls.lock().unwrap().push(blocking);
            pop(&factory.results, "MockDeviceFactory")
        })
    }
}
