// Keyscope
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::{Cursor, StoreError};

/// Errors raised by a profiling run. Every store failure is fatal for the run.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Store connection failed: {0}")]
    StoreConnection(#[source] StoreError),
    #[error("Scan batch failed at cursor {cursor}: {source}")]
    StoreBatch {
        cursor: Cursor,
        #[source]
        source: StoreError,
    },
    #[error("Introspection failed for key '{key}': {source}")]
    Introspection {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid scan state: {0}")]
    InvalidState(String),
    #[error("Report unavailable: {0}")]
    ReportUnavailable(String),
    #[error("Failed to read prefix file {}: {source}", .path.display())]
    PrefixFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ProfileResult<T> = Result<T, ProfileError>;
