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

//! Error and result types shared by all driver interfaces.

use std::fmt;

use num_derive::FromPrimitive;
use thiserror::Error;

use crate::types::OutputShape;

/// Status codes a driver call can fail with. Keep in sync with the HAL's `ErrorStatus` values.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Hash, PartialEq)]
#[repr(i32)]
pub enum ErrorStatus {
    /// The driver is not available to take on new work.
    DeviceUnavailable = 1,
    /// The catch-all failure status for operations that failed for any unlisted reason.
    GeneralFailure = 2,
    /// An output operand's provided buffer was too small for the actual output.
    OutputInsufficientSize = 3,
    /// The caller passed an argument the driver rejects.
    InvalidArgument = 4,
    /// The deadline passed before the work completed; retrying may succeed.
    MissedDeadlineTransient = 5,
    /// The deadline passed before the work completed; retrying will not succeed.
    MissedDeadlinePersistent = 6,
    /// The driver ran out of a resource; retrying may succeed.
    ResourceExhaustedTransient = 7,
    /// The driver ran out of a resource; retrying will not succeed.
    ResourceExhaustedPersistent = 8,
    /// The remote process backing the object has terminated.
    DeadObject = 10000,
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::DeviceUnavailable => "DEVICE_UNAVAILABLE",
            Self::GeneralFailure => "GENERAL_FAILURE",
            Self::OutputInsufficientSize => "OUTPUT_INSUFFICIENT_SIZE",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::MissedDeadlineTransient => "MISSED_DEADLINE_TRANSIENT",
            Self::MissedDeadlinePersistent => "MISSED_DEADLINE_PERSISTENT",
            Self::ResourceExhaustedTransient => "RESOURCE_EXHAUSTED_TRANSIENT",
            Self::ResourceExhaustedPersistent => "RESOURCE_EXHAUSTED_PERSISTENT",
            Self::DeadObject => "DEAD_OBJECT",
        };
        f.write_str(name)
    }
}

/// A failure from a driver call: a status code plus a human-readable message.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{status}: {message}")]
pub struct GeneralError {
    /// Why the call failed.
    pub status: ErrorStatus,
    /// Human-readable context, accumulated as the failure propagates.
    pub message: String,
}

impl GeneralError {
    /// Creates an error with the given status and message.
    pub fn new(status: ErrorStatus, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// Creates a [`ErrorStatus::GeneralFailure`] error with the given message.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::GeneralFailure, message)
    }
}

/// Result type for driver calls outside the execution path.
pub type GeneralResult<T> = Result<T, GeneralError>;

/// A failure from an execution.
///
/// When the failure is [`ErrorStatus::OutputInsufficientSize`], `output_shapes` carries the
/// shapes the driver actually produced so the caller can resize its output buffers and retry.
/// For every other status the vector is empty.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{status}: {message}")]
pub struct ExecutionError {
    /// Why the execution failed.
    pub status: ErrorStatus,
    /// Human-readable context.
    pub message: String,
    /// Actual output shapes, populated only for insufficient-size failures.
    pub output_shapes: Vec<OutputShape>,
}

impl ExecutionError {
    /// Creates an execution error with no output shape information.
    pub fn new(status: ErrorStatus, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), output_shapes: Vec::new() }
    }

    /// Creates a [`ErrorStatus::GeneralFailure`] execution error with the given message.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::GeneralFailure, message)
    }
}

impl From<GeneralError> for ExecutionError {
    fn from(error: GeneralError) -> Self {
        Self::new(error.status, error.message)
    }
}

/// Result type for the execution path.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn error_status_from_raw_code() {
        assert_eq!(ErrorStatus::from_i32(2), Some(ErrorStatus::GeneralFailure));
        assert_eq!(ErrorStatus::from_i32(10000), Some(ErrorStatus::DeadObject));
        assert_eq!(ErrorStatus::from_i32(9999), None);
        assert_eq!(ErrorStatus::from_i32(0), None);
    }

    #[test]
    fn general_error_display() {
        let error = GeneralError::new(ErrorStatus::DeadObject, "driver process exited");
        assert_eq!(error.to_string(), "DEAD_OBJECT: driver process exited");
    }

    #[test]
    fn general_shorthand_uses_general_failure() {
        let error = GeneralError::general("no such device");
        assert_eq!(error.status, ErrorStatus::GeneralFailure);
        assert_eq!(error.message, "no such device");
    }

    #[test]
    fn execution_error_from_general_error() {
        let error = ExecutionError::from(GeneralError::new(ErrorStatus::InvalidArgument, "bad"));
        assert_eq!(error.status, ErrorStatus::InvalidArgument);
        assert_eq!(error.message, "bad");
        assert!(error.output_shapes.is_empty());
    }
}
