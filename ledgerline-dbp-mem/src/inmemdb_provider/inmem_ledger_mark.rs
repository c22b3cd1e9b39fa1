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

//! Processed marker of a ledger entry.

/// Processed marker of a ledger entry.
pub struct InMemLedgerMark {
    /// Token of the caller that created this entry.
    claim: u64,
    /// Time of processing in epoch microseconds.
    processed_at_micros: u64,
}

impl InMemLedgerMark {
    /// Return a new instance.
    pub fn new(claim: u64, processed_at_micros: u64) -> Self {
        Self {
            claim,
            processed_at_micros,
        }
    }

    /// Return `true` if the entry was created with this claim token.
    pub fn is_claimed_by(&self, claim: u64) -> bool {
        self.claim == claim
    }

    /// Time of processing in epoch microseconds.
    pub fn processed_at_micros(&self) -> u64 {
        self.processed_at_micros
    }
}
