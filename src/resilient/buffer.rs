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

use crate::driver::{Buffer, BufferFactory, SharedBuffer};
use crate::error::GeneralResult;
use crate::types::{MemoryDomainToken, SharedMemory};

/// A [`Buffer`] wrapper with the same ownership shape as
/// [`ResilientDevice`](crate::resilient::ResilientDevice), minus the reconnection.
///
/// Like a prepared model, a driver-allocated buffer only comes back by re-running the owning
/// device's `allocate`, so calls delegate to the current object as-is and a dead-object failure
/// is the caller's to handle.
pub struct ResilientBuffer {
    // Kept for the day a dead buffer can be remade through the owning device.
    #[allow(dead_code)]
    make_buffer: BufferFactory,
    buffer: Mutex<SharedBuffer>,
}

impl ResilientBuffer {
    /// Makes a buffer through `make_buffer` and wraps it.
    pub fn create(make_buffer: BufferFactory) -> GeneralResult<Arc<Self>> {
        let buffer = make_buffer()?;
        Ok(Arc::new(Self { make_buffer, buffer: Mutex::new(buffer) }))
    }

    /// Returns the current buffer.
    pub fn buffer(&self) -> SharedBuffer {
        self.buffer.lock().unwrap().clone()
    }

    /// Handles the loss of the remote buffer by re-returning the current object: the factory is
    /// deliberately not invoked (see the type-level comment).
    pub fn recover(&self, _failing_buffer: &SharedBuffer) -> SharedBuffer {
        self.buffer.lock().unwrap().clone()
    }
}

impl Buffer for ResilientBuffer {
    fn token(&self) -> MemoryDomainToken {
        self.buffer().token()
    }

    fn copy_to(&self, dst: &SharedMemory) -> GeneralResult<()> {
        self.buffer().copy_to(dst)
    }

    fn copy_from(&self, src: &SharedMemory, dimensions: &[u32]) -> GeneralResult<()> {
        self.buffer().copy_from(src, dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorStatus, GeneralError};
    use crate::testing::{same_object, MockBuffer};
    use crate::types::Memory;

    fn setup() -> (Arc<MockBuffer>, Arc<ResilientBuffer>) {
        let mock = Arc::new(MockBuffer::new(MemoryDomainToken(7)));
        let inner: SharedBuffer = mock.clone();
        let resilient = ResilientBuffer::create(Box::new(move || Ok(inner.clone()))).unwrap();
        (mock, resilient)
    }

    #[test]
    fn create_propagates_factory_failure() {
        let make: BufferFactory = Box::new(|| Err(GeneralError::general("allocation failed")));

        let error = ResilientBuffer::create(make).map(|_| ()).unwrap_err();

        assert_eq!(error.status, ErrorStatus::GeneralFailure);
        assert_eq!(error.message, "allocation failed");
    }

    #[test]
    fn token_delegates() {
        let (_mock, resilient) = setup();
        assert_eq!(resilient.token(), MemoryDomainToken(7));
    }

    #[test]
    fn copies_delegate() {
        let (mock, resilient) = setup();
        let memory = Arc::new(Memory { name: "pool".to_string(), size: 1024 });
        mock.expect_copy_to(Ok(()));
        mock.expect_copy_from(Err(GeneralError::new(ErrorStatus::DeadObject, "driver died")));

        resilient.copy_to(&memory).unwrap();
        let error = resilient.copy_from(&memory, &[2, 2]).unwrap_err();

        // Dead-object failures are surfaced as-is; there is nothing to retry against.
        assert_eq!(error.status, ErrorStatus::DeadObject);
    }

    #[test]
    fn recover_re_returns_current_object() {
        let (mock, resilient) = setup();
        let failing: SharedBuffer = mock.clone();

        let result = resilient.recover(&failing);

        assert!(same_object(&result, &mock));
        assert!(same_object(&resilient.buffer(), &mock));
    }
}
