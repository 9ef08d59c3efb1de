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

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::error;

use crate::driver::{
    Device, DeviceFactory, SharedBuffer, SharedCacheFile, SharedDevice, SharedPreparedModel,
};
use crate::error::{ErrorStatus, GeneralError, GeneralResult};
use crate::invalid::{InvalidBuffer, InvalidDevice, InvalidPreparedModel};
use crate::types::{
    BufferDesc, BufferRole, CacheToken, Capabilities, DeviceType, ExecutionPreference, Extension,
    FeatureLevel, Model, Priority,
};

/// Invokes `run` against the wrapper's current connection, reconnecting once if that connection
/// is dead.
///
/// Only [`ErrorStatus::DeadObject`] triggers a reconnect; any other failure is returned
/// unchanged. If the reconnect fails, the original failure is returned with the reconnect
/// failure appended to its message. After a successful reconnect, `run` is invoked once more on
/// the new connection and that result is returned as-is.
fn protect<T>(
    device: &ResilientDevice,
    blocking: bool,
    run: impl Fn(&dyn Device) -> GeneralResult<T>,
) -> GeneralResult<T> {
    let current = device.device();
    let failure = match run(current.as_ref()) {
        Err(e) if e.status == ErrorStatus::DeadObject => e,
        result => return result,
    };

    let replacement = match device.recover(&current, blocking) {
        Ok(replacement) => replacement,
        Err(e) => {
            let message = format!(
                "{}, and failed to recover the dead device with {}: {}",
                failure.message, e.status, e.message
            );
            return Err(GeneralError::new(failure.status, message));
        }
    };

    run(replacement.as_ref())
}

struct State {
    device: SharedDevice,
    is_valid: bool,
}

/// A [`Device`] that survives the crash of the driver process backing it.
///
/// The wrapper owns the current connection to a driver together with the factory that made it.
/// When a call fails with [`ErrorStatus::DeadObject`], the factory is asked for a fresh
/// connection and the call is retried once. Name, version string, extensions, and capabilities
/// are captured from the first connection and served to callers unchanged for the lifetime of
/// the wrapper; if a replacement connection reports different metadata, it is a different device
/// and the wrapper permanently degrades to an [`InvalidDevice`] instead of silently changing
/// identity under its callers.
pub struct ResilientDevice {
    make_device: DeviceFactory,
    name: String,
    version_string: String,
    extensions: Vec<Extension>,
    capabilities: Capabilities,
    state: Mutex<State>,
}

impl ResilientDevice {
    /// Makes the first, blocking connection through `make_device` and wraps it.
    ///
    /// Fails with the factory's error if the connection cannot be made; no wrapper is produced
    /// in that case.
    pub fn create(make_device: DeviceFactory) -> GeneralResult<Arc<Self>> {
        let device = make_device(true)?;
        Ok(Arc::new(Self {
            name: device.name().to_string(),
            version_string: device.version_string().to_string(),
            extensions: device.supported_extensions().to_vec(),
            capabilities: device.capabilities().clone(),
            make_device,
            state: Mutex::new(State { device, is_valid: true }),
        }))
    }

    /// Returns the current connection. Never makes a remote call.
    pub fn device(&self) -> SharedDevice {
        self.state.lock().unwrap().device.clone()
    }

    /// Returns false once a replacement connection has turned out to be a different device.
    pub fn is_valid(&self) -> bool {
        self.state.lock().unwrap().is_valid
    }

    /// Replaces the current connection with a fresh one from the factory.
    ///
    /// `failing_device` is the connection the caller observed failing. If it is no longer the
    /// current one, another caller has already recovered; the current connection is returned
    /// without asking the factory for a new one. A replacement whose metadata disagrees with the
    /// failing connection's is not adopted: an [`InvalidDevice`] carrying the cached metadata is
    /// installed instead and the wrapper is marked invalid for good.
    pub fn recover(
        &self,
        failing_device: &SharedDevice,
        blocking: bool,
    ) -> GeneralResult<SharedDevice> {
        let mut state = self.state.lock().unwrap();

        // Another caller already replaced the failing connection.
        if !Arc::ptr_eq(&state.device, failing_device) {
            return Ok(state.device.clone());
        }

        let device = (self.make_device)(blocking).map_err(|e| {
            let message = format!("failed to get a replacement device: {}", e.message);
            GeneralError::new(e.status, message)
        })?;

        if metadata_differs(state.device.as_ref(), device.as_ref()) {
            error!(
                "replacement for device {} reports different metadata than what is cached, \
                 marking the device invalid",
                self.name
            );
            let invalid = InvalidDevice::new(
                self.name.clone(),
                self.version_string.clone(),
                state.device.feature_level(),
                state.device.device_type(),
                self.extensions.clone(),
                self.capabilities.clone(),
                state.device.number_of_cache_files_needed(),
            );
            state.device = Arc::new(invalid);
            state.is_valid = false;
        } else {
            state.device = device;
        }
        Ok(state.device.clone())
    }
}

fn metadata_differs(current: &dyn Device, replacement: &dyn Device) -> bool {
    current.name() != replacement.name()
        || current.version_string() != replacement.version_string()
        || current.feature_level() != replacement.feature_level()
        || current.device_type() != replacement.device_type()
        || current.supported_extensions() != replacement.supported_extensions()
        || current.capabilities() != replacement.capabilities()
}

impl Device for ResilientDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn version_string(&self) -> &str {
        &self.version_string
    }

    fn feature_level(&self) -> FeatureLevel {
        self.device().feature_level()
    }

    fn device_type(&self) -> DeviceType {
        self.device().device_type()
    }

    fn supported_extensions(&self) -> &[Extension] {
        &self.extensions
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn number_of_cache_files_needed(&self) -> (u32, u32) {
        self.device().number_of_cache_files_needed()
    }

    fn wait(&self) -> GeneralResult<()> {
        // Waiting for the driver is the one operation where blocking on a reconnect is wanted.
        protect(self, true, |device| device.wait())
    }

    fn supported_operations(&self, model: &Model) -> GeneralResult<Vec<bool>> {
        protect(self, false, |device| device.supported_operations(model))
    }

    fn prepare_model(
        &self,
        model: &Model,
        preference: ExecutionPreference,
        priority: Priority,
        deadline: Option<Instant>,
        model_cache: &[SharedCacheFile],
        data_cache: &[SharedCacheFile],
        token: CacheToken,
    ) -> GeneralResult<SharedPreparedModel> {
        if !self.is_valid() {
            return Ok(Arc::new(InvalidPreparedModel));
        }
        protect(self, false, |device| {
            device.prepare_model(
                model,
                preference,
                priority,
                deadline,
                model_cache,
                data_cache,
                token,
            )
        })
    }

    fn prepare_model_from_cache(
        &self,
        deadline: Option<Instant>,
        model_cache: &[SharedCacheFile],
        data_cache: &[SharedCacheFile],
        token: CacheToken,
    ) -> GeneralResult<SharedPreparedModel> {
        if !self.is_valid() {
            return Ok(Arc::new(InvalidPreparedModel));
        }
        protect(self, false, |device| {
            device.prepare_model_from_cache(deadline, model_cache, data_cache, token)
        })
    }

    fn allocate(
        &self,
        desc: &BufferDesc,
        prepared_models: &[SharedPreparedModel],
        input_roles: &[BufferRole],
        output_roles: &[BufferRole],
    ) -> GeneralResult<SharedBuffer> {
        if !self.is_valid() {
            return Ok(Arc::new(InvalidBuffer));
        }
        protect(self, false, |device| {
            device.allocate(desc, prepared_models, input_roles, output_roles)
        })
    }
}

impl fmt::Debug for ResilientDevice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ResilientDevice")
            .field("name", &self.name)
            .field("is_valid", &self.is_valid())
            .finish()
    }
}
