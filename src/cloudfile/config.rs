/*
 * Copyright (C) 2026 The Cloudfile Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::env;

/// Environment variable overriding the storage domain suffix.
pub const STORAGE_SUFFIX_ENV: &str = "CLOUDFILE_STORAGE_SUFFIX";

/// Suffix appended to account names when no server is named in the volume
/// context; the resolved host is `<account>.file.<suffix>`.
pub const DEFAULT_STORAGE_SUFFIX: &str = "core.cloudfile.io";

/// Cloud-level defaults the node driver needs to resolve share endpoints.
/// Constructed once at process start and handed to [`crate::cloudfile::NodeDriver`];
/// tests build their own instead of mutating process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEnvironment {
    pub storage_suffix: String,
}

impl CloudEnvironment {
    pub fn new(storage_suffix: impl Into<String>) -> Self {
        Self {
            storage_suffix: storage_suffix.into(),
        }
    }

    pub fn from_env() -> Self {
        let storage_suffix = env::var(STORAGE_SUFFIX_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_STORAGE_SUFFIX.to_string());
        Self { storage_suffix }
    }
}
