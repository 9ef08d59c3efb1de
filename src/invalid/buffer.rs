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

use crate::driver::Buffer;
use crate::error::{GeneralError, GeneralResult};
use crate::types::{MemoryDomainToken, SharedMemory};

/// A [`Buffer`] whose every operation fails and whose token is the never-valid zero.
pub struct InvalidBuffer;

impl Buffer for InvalidBuffer {
    fn token(&self) -> MemoryDomainToken {
        MemoryDomainToken::default()
    }

    fn copy_to(&self, _dst: &SharedMemory) -> GeneralResult<()> {
        Err(GeneralError::general("InvalidBuffer"))
    }

    fn copy_from(&self, _src: &SharedMemory, _dimensions: &[u32]) -> GeneralResult<()> {
        Err(GeneralError::general("InvalidBuffer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorStatus;
    use crate::types::Memory;
    use std::sync::Arc;

    #[test]
    fn token_is_never_valid() {
        assert_eq!(InvalidBuffer.token(), MemoryDomainToken(0));
    }

    #[test]
    fn copies_fail_with_fixed_diagnostic() {
        let memory = Arc::new(Memory { name: "pool".to_string(), size: 1024 });
        for error in [
            InvalidBuffer.copy_to(&memory).unwrap_err(),
            InvalidBuffer.copy_from(&memory, &[2, 2]).unwrap_err(),
        ] {
            assert_eq!(error.status, ErrorStatus::GeneralFailure);
            assert_eq!(error.message, "InvalidBuffer");
        }
    }
}
