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

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// In-flight-operation table keyed by volume ID. Acquisition is a single
/// test-and-insert under one mutex; contenders are rejected, never queued.
pub struct VolumeLocks {
    held: Mutex<HashSet<String>>,
}

impl VolumeLocks {
    pub fn new() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
        }
    }

    /// Claims `volume_id` for the caller. Returns `None` when another
    /// operation on the same volume is still in flight. The returned guard
    /// releases the claim when dropped, on success, error, and unwind alike.
    pub fn try_acquire(&self, volume_id: &str) -> Option<VolumeLockGuard<'_>> {
        let mut held = self.table();
        if !held.insert(volume_id.to_string()) {
            return None;
        }
        Some(VolumeLockGuard {
            locks: self,
            volume_id: volume_id.to_string(),
        })
    }

    fn release(&self, volume_id: &str) {
        self.table().remove(volume_id);
    }

    fn table(&self) -> MutexGuard<'_, HashSet<String>> {
        self.held
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for VolumeLocks {
    fn default() -> Self {
        Self::new()
    }
}

pub struct VolumeLockGuard<'a> {
    locks: &'a VolumeLocks,
    volume_id: String,
}

impl VolumeLockGuard<'_> {
    pub fn volume_id(&self) -> &str {
        &self.volume_id
    }
}

impl Drop for VolumeLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.volume_id);
    }
}
