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

use std::time::{Duration, Instant};

use crate::driver::{PreparedModel, SharedBurst, SharedExecution};
use crate::error::{ExecutionError, ExecutionResult, GeneralError, GeneralResult};
use crate::types::{OutputShape, Request, SyncFence, Timing};

/// A [`PreparedModel`] whose every operation fails. Stateless and trivially thread-safe.
pub struct InvalidPreparedModel;

impl PreparedModel for InvalidPreparedModel {
    fn execute(
        &self,
        _request: &Request,
        _measure: bool,
        _deadline: Option<Instant>,
        _loop_timeout: Option<Duration>,
    ) -> ExecutionResult<(Vec<OutputShape>, Timing)> {
        Err(ExecutionError::general("InvalidPreparedModel"))
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
        Err(GeneralError::general("InvalidPreparedModel"))
    }

    fn create_reusable_execution(
        &self,
        _request: &Request,
        _measure: bool,
        _loop_timeout: Option<Duration>,
    ) -> GeneralResult<SharedExecution> {
        Err(GeneralError::general("InvalidPreparedModel"))
    }

    fn configure_execution_burst(&self) -> GeneralResult<SharedBurst> {
        Err(GeneralError::general("InvalidPreparedModel"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorStatus;

    #[test]
    fn execute_fails_with_fixed_diagnostic() {
        let error =
            InvalidPreparedModel.execute(&Request::default(), false, None, None).unwrap_err();
        assert_eq!(error.status, ErrorStatus::GeneralFailure);
        assert_eq!(error.message, "InvalidPreparedModel");
        assert!(error.output_shapes.is_empty());
    }

    #[test]
    fn remaining_operations_fail_with_fixed_diagnostic() {
        let model = InvalidPreparedModel;
        for error in [
            model
                .execute_fenced(&Request::default(), &[], false, None, None, None)
                .map(|_| ())
                .unwrap_err(),
            model
                .create_reusable_execution(&Request::default(), false, None)
                .map(|_| ())
                .unwrap_err(),
            model.configure_execution_burst().map(|_| ()).unwrap_err(),
        ] {
            assert_eq!(error.status, ErrorStatus::GeneralFailure);
            assert_eq!(error.message, "InvalidPreparedModel");
        }
    }
}
