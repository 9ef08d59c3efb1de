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

use std::time::Instant;

use crate::driver::{Device, SharedBuffer, SharedCacheFile, SharedPreparedModel};
use crate::error::{GeneralError, GeneralResult};
use crate::types::{
    BufferDesc, BufferRole, CacheToken, Capabilities, DeviceType, ExecutionPreference, Extension,
    FeatureLevel, Model, Priority,
};

/// A [`Device`] that answers metadata queries from a frozen snapshot and fails everything else.
///
/// Carries the last-known-good metadata of a device that can no longer be reached, so read-only
/// accessors keep answering correctly after the device is gone. It has no state beyond the
/// snapshot and never changes across calls.
pub struct InvalidDevice {
    name: String,
    version_string: String,
    feature_level: FeatureLevel,
    device_type: DeviceType,
    extensions: Vec<Extension>,
    capabilities: Capabilities,
    cache_files_needed: (u32, u32),
}

impl InvalidDevice {
    /// Freezes the given metadata into a new sentinel.
    pub fn new(
        name: String,
        version_string: String,
        feature_level: FeatureLevel,
        device_type: DeviceType,
        extensions: Vec<Extension>,
        capabilities: Capabilities,
        cache_files_needed: (u32, u32),
    ) -> Self {
        Self {
            name,
            version_string,
            feature_level,
            device_type,
            extensions,
            capabilities,
            cache_files_needed,
        }
    }
}

impl Device for InvalidDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn version_string(&self) -> &str {
        &self.version_string
    }

    fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    fn supported_extensions(&self) -> &[Extension] {
        &self.extensions
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn number_of_cache_files_needed(&self) -> (u32, u32) {
        self.cache_files_needed
    }

    fn wait(&self) -> GeneralResult<()> {
        Err(GeneralError::general("InvalidDevice"))
    }

    fn supported_operations(&self, _model: &Model) -> GeneralResult<Vec<bool>> {
        Err(GeneralError::general("InvalidDevice"))
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
        Err(GeneralError::general("InvalidDevice"))
    }

    fn prepare_model_from_cache(
        &self,
        _deadline: Option<Instant>,
        _model_cache: &[SharedCacheFile],
        _data_cache: &[SharedCacheFile],
        _token: CacheToken,
    ) -> GeneralResult<SharedPreparedModel> {
        Err(GeneralError::general("InvalidDevice"))
    }

    fn allocate(
        &self,
        _desc: &BufferDesc,
        _prepared_models: &[SharedPreparedModel],
        _input_roles: &[BufferRole],
        _output_roles: &[BufferRole],
    ) -> GeneralResult<SharedBuffer> {
        Err(GeneralError::general("InvalidDevice"))
    }
}
