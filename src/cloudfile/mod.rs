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

pub mod config;
pub mod format;
pub mod locks;
pub mod logger;
pub mod mount;
pub mod node;
pub mod status;
pub mod test_support;
pub mod types;
pub mod util;
pub mod volume;

#[allow(unused_imports)]
// Re-exported for downstream crates/tests that depend on the public node API.
pub use config::CloudEnvironment;
#[allow(unused_imports)]
// Re-exported for downstream crates/tests that depend on the public node API.
pub use node::NodeDriver;
#[allow(unused_imports)]
// Re-exported so external callers can match on RPC outcomes without reaching into submodules.
pub use status::{Code, Status};
