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

//! End-to-end recovery scenarios through the public API.

use std::sync::Arc;

use nnhal_common::driver::{Device, PreparedModel, SharedCacheFile, SharedDevice};
use nnhal_common::testing::{same_object, MockDevice, MockDeviceFactory, MockPreparedModel};
use nnhal_common::types::{CacheToken, FeatureLevel, Request};
use nnhal_common::{ErrorStatus, GeneralError, ResilientDevice};

const DEVICE_NAME: &str = "vendor-npu";
const TOKEN: CacheToken = [0x5a; 32];

fn cache_file() -> SharedCacheFile {
    Arc::new(tempfile::tempfile().unwrap())
}

#[test]
fn driver_restart_is_transparent_to_the_caller() {
    let mock = Arc::new(MockDevice::new(DEVICE_NAME));
    let factory = MockDeviceFactory::new();
    factory.expect(Ok(mock.clone()));
    let device = ResilientDevice::create(factory.as_factory()).unwrap();

    let model_cache = [cache_file()];
    let data_cache = [cache_file()];

    // The driver restarts between creation and this call.
    mock.expect_prepare_model_from_cache(Err(GeneralError::new(
        ErrorStatus::DeadObject,
        "driver died",
    )));
    let restarted = Arc::new(MockDevice::new(DEVICE_NAME));
    let prepared = Arc::new(MockPreparedModel::new());
    restarted.expect_prepare_model_from_cache(Ok(prepared.clone()));
    factory.expect(Ok(restarted.clone()));

    let result =
        device.prepare_model_from_cache(None, &model_cache, &data_cache, TOKEN).unwrap();
    assert!(same_object(&result, &prepared));

    // Follow-up calls go straight to the restarted driver, with no further factory calls.
    let prepared_again = Arc::new(MockPreparedModel::new());
    restarted.expect_prepare_model_from_cache(Ok(prepared_again.clone()));
    let result =
        device.prepare_model_from_cache(None, &model_cache, &data_cache, TOKEN).unwrap();
    assert!(same_object(&result, &prepared_again));
    assert_eq!(factory.calls(), vec![true, false]);
}

#[test]
fn driver_update_permanently_invalidates_the_device() {
    let mock = Arc::new(MockDevice::new(DEVICE_NAME));
    let factory = MockDeviceFactory::new();
    factory.expect(Ok(mock.clone()));
    let device = ResilientDevice::create(factory.as_factory()).unwrap();

    // The restarted driver reports a newer version: a different device as far as callers are
    // concerned.
    let updated = Arc::new(MockDevice::new(DEVICE_NAME).with_version_string("version2"));
    factory.expect(Ok(updated));
    let failing: SharedDevice = mock.clone();
    device.recover(&failing, false).unwrap();
    assert!(!device.is_valid());

    // Metadata keeps answering from the creation-time snapshot.
    assert_eq!(device.name(), DEVICE_NAME);
    assert_eq!(device.version_string(), "version1");
    assert_eq!(device.feature_level(), FeatureLevel::Level5);

    // Operational calls fail fast without reaching for the factory again.
    let error = device.wait().unwrap_err();
    assert_eq!(error.status, ErrorStatus::GeneralFailure);
    assert_eq!(error.message, "InvalidDevice");

    let prepared = device.prepare_model_from_cache(None, &[], &[], TOKEN).unwrap();
    let error = prepared.execute(&Request::default(), false, None, None).unwrap_err();
    assert_eq!(error.message, "InvalidPreparedModel");

    assert_eq!(factory.calls(), vec![true, false]);
}
