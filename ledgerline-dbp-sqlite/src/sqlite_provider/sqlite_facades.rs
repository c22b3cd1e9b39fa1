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

//! SQLite specific database code.

mod sqlite_dedup_ledger_facade;
mod sqlite_ledger_query_facade;

pub use self::sqlite_dedup_ledger_facade::*;
pub use self::sqlite_ledger_query_facade::*;
use super::SqliteDatabaseProvider;
use ledgerline_dbp::dbp::facades::*;
use std::sync::Arc;

/// SQLite specific database code.
pub struct SqliteProviderFacades {
    dedup_ledger_facade: SqliteDedupLedgerFacade,
    ledger_query_facade: SqliteLedgerQueryFacade,
}

impl SqliteProviderFacades {
    /// Return a new instance.
    pub fn new(sqlite_provider: &Arc<SqliteDatabaseProvider>) -> Self {
        Self {
            dedup_ledger_facade: SqliteDedupLedgerFacade::new(sqlite_provider),
            ledger_query_facade: SqliteLedgerQueryFacade::new(sqlite_provider),
        }
    }
}

impl DatabaseProviderFacades for SqliteProviderFacades {
    fn dedup_ledger_facade(&self) -> &dyn DedupLedgerFacade {
        &self.dedup_ledger_facade
    }

    fn ledger_query_facade(&self) -> &dyn LedgerQueryFacade {
        &self.ledger_query_facade
    }
}
