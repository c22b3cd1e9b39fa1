/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

//! Ingestion errors.

use std::error::Error;
use std::fmt;

/// Cause of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestErrorKind {
    /// General failure. See message for details.
    Unspecified,
    /// The event does not have the expected shape. E.g. an empty topic or a
    /// timestamp that cannot be parsed.
    MalformedEvent,
    /// The deduplication ledger is unavailable or corrupt.
    StorageFault,
    /// The processing side-effect failed after the dedup decision was made.
    ProcessorFailure,
}

impl IngestErrorKind {
    /// Create a new instance with an error message.
    pub fn error_with_msg<S: AsRef<str>>(self, msg: S) -> IngestError {
        IngestError {
            kind: self,
            msg: msg.as_ref().to_string(),
        }
    }
}

impl fmt::Display for IngestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/** Ingestion error.

Create a new instance via [IngestErrorKind].
*/
#[derive(Debug)]
pub struct IngestError {
    kind: IngestErrorKind,
    msg: String,
}

impl IngestError {
    /// Return the type of error.
    pub fn kind(&self) -> &IngestErrorKind {
        &self.kind
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.msg)
    }
}

impl AsRef<IngestError> for IngestError {
    fn as_ref(&self) -> &IngestError {
        self
    }
}

impl Error for IngestError {}
