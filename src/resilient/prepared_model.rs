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

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::driver::{
    PreparedModel, PreparedModelFactory, SharedBurst, SharedExecution, SharedPreparedModel,
};
use crate::error::{ExecutionResult, GeneralResult};
use crate::types::{OutputShape, Request, SyncFence, Timing};

/// A [`PreparedModel`] wrapper with the same ownership shape as
/// [`ResilientDevice`](crate::resilient::ResilientDevice), minus the reconnection.
///
/// A compiled model cannot be remade here: only the owning device can re-run `prepare_model`,
/// and doing so behind the caller's back would redo an expensive compilation at an unpredictable
/// time. Calls therefore delegate to the current object as-is, and a dead-object failure is the
/// caller's to handle.
//
// TODO: let the owning device re-run prepare_model to replace a dead prepared model, and route
// these calls through the same protect/retry helper the device uses.
pub struct ResilientPreparedModel {
    // Kept for the day a dead prepared model can be remade through the owning device.
    #[allow(dead_code)]
    make_prepared_model: PreparedModelFactory,
    prepared_model: Mutex<SharedPreparedModel>,
}

impl ResilientPreparedModel {
    /// Makes a prepared model through `make_prepared_model` and wraps it.
    pub fn create(make_prepared_model: PreparedModelFactory) -> GeneralResult<Arc<Self>> {
        let prepared_model = make_prepared_model()?;
        Ok(Arc::new(Self { make_prepared_model, prepared_model: Mutex::new(prepared_model) }))
    }

    /// Returns the current prepared model.
    pub fn prepared_model(&self) -> SharedPreparedModel {
        self.prepared_model.lock().unwrap().clone()
    }

    /// Handles the loss of the remote prepared model by re-returning the current object: the
    /// factory is deliberately not invoked (see the type-level comment).
    pub fn recover(&self, _failing_prepared_model: &SharedPreparedModel) -> SharedPreparedModel {
        self.prepared_model.lock().unwrap().clone()
    }
}

impl PreparedModel for ResilientPreparedModel {
    fn execute(
        &self,
        request: &Request,
        measure: bool,
        deadline: Option<Instant>,
        loop_timeout: Option<Duration>,
    ) -> ExecutionResult<(Vec<OutputShape>, Timing)> {
        self.prepared_model().execute(request, measure, deadline, loop_timeout)
    }

    fn execute_fenced(
        &self,
        request: &Request,
        wait_for: &[SyncFence],
        measure: bool,
        deadline: Option<Instant>,
        loop_timeout: Option<Duration>,
        timeout_after_fence: Option<Duration>,
    ) -> GeneralResult<Option<SyncFence>> {
        self.prepared_model().execute_fenced(
            request,
            wait_for,
            measure,
            deadline,
            loop_timeout,
            timeout_after_fence,
        )
    }

    fn create_reusable_execution(
        &self,
        request: &Request,
        measure: bool,
        loop_timeout: Option<Duration>,
    ) -> GeneralResult<SharedExecution> {
        self.prepared_model().create_reusable_execution(request, measure, loop_timeout)
    }

    fn configure_execution_burst(&self) -> GeneralResult<SharedBurst> {
        self.prepared_model().configure_execution_burst()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorStatus, ExecutionError, GeneralError};
    use crate::testing::{same_object, MockBurst, MockExecution, MockPreparedModel};

    fn setup() -> (Arc<MockPreparedModel>, Arc<ResilientPreparedModel>) {
        let mock = Arc::new(MockPreparedModel::new());
        let inner: SharedPreparedModel = mock.clone();
        let resilient =
            ResilientPreparedModel::create(Box::new(move || Ok(inner.clone()))).unwrap();
        (mock, resilient)
    }

    #[test]
    fn create_propagates_factory_failure() {
        let make: PreparedModelFactory =
            Box::new(|| Err(GeneralError::general("compilation failed")));

        let error = ResilientPreparedModel::create(make).map(|_| ()).unwrap_err();

        assert_eq!(error.status, ErrorStatus::GeneralFailure);
        assert_eq!(error.message, "compilation failed");
    }

    #[test]
    fn prepared_model_returns_current_object() {
        let (mock, resilient) = setup();
        assert!(same_object(&resilient.prepared_model(), &mock));
    }

    #[test]
    fn execute_delegates() {
        let (mock, resilient) = setup();
        let shapes = vec![OutputShape { dimensions: vec![1, 2], is_sufficient: true }];
        mock.expect_execute(Ok((shapes.clone(), Timing::default())));

        let (result_shapes, timing) =
            resilient.execute(&Request::default(), false, None, None).unwrap();

        assert_eq!(result_shapes, shapes);
        assert_eq!(timing, Timing::default());
    }

    #[test]
    fn execute_dead_object_is_not_retried() {
        let (mock, resilient) = setup();
        mock.expect_execute(Err(ExecutionError::new(ErrorStatus::DeadObject, "driver died")));

        let error = resilient.execute(&Request::default(), false, None, None).unwrap_err();

        assert_eq!(error.status, ErrorStatus::DeadObject);
        assert_eq!(error.message, "driver died");
    }

    #[test]
    fn execute_fenced_delegates() {
        let (mock, resilient) = setup();
        mock.expect_execute_fenced(Ok(None));

        let fence = resilient
            .execute_fenced(&Request::default(), &[], false, None, None, None)
            .unwrap();

        assert!(fence.is_none());
    }

    #[test]
    fn create_reusable_execution_delegates() {
        let (mock, resilient) = setup();
        let execution = Arc::new(MockExecution::new());
        mock.expect_create_reusable_execution(Ok(execution.clone()));

        let result = resilient.create_reusable_execution(&Request::default(), false, None).unwrap();

        assert!(same_object(&result, &execution));
    }

    #[test]
    fn configure_execution_burst_delegates() {
        let (mock, resilient) = setup();
        let burst = Arc::new(MockBurst::new());
        mock.expect_configure_execution_burst(Ok(burst.clone()));

        let result = resilient.configure_execution_burst().unwrap();

        assert!(same_object(&result, &burst));
    }

    #[test]
    fn recover_re_returns_current_object_without_factory_call() {
        let mock = Arc::new(MockPreparedModel::new());
        let inner: SharedPreparedModel = mock.clone();
        let factory_calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = factory_calls.clone();
        let resilient = ResilientPreparedModel::create(Box::new(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            Ok(inner.clone())
        }))
        .unwrap();

        let failing: SharedPreparedModel = mock.clone();
        let result = resilient.recover(&failing);

        assert!(same_object(&result, &mock));
        assert_eq!(factory_calls.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
