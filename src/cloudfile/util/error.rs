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

use std::error::Error;
use std::fmt;
use std::io;

/// Boxed error currency used throughout the mount and format layers.
pub type DynError = Box<dyn Error + Send + Sync>;

#[derive(Debug)]
struct ContextError {
    context: String,
    source: DynError,
}

impl ContextError {
    fn new(context: impl Into<String>, source: impl Into<DynError>) -> Self {
        Self {
            context: context.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[derive(Debug)]
struct SimpleError(String);

impl SimpleError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for SimpleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for SimpleError {}

/// Wraps `error` so it displays as `{context}: {error}` while keeping the
/// original reachable through `source()`.
pub fn with_context<E>(error: E, context: impl Into<String>) -> DynError
where
    E: Into<DynError>,
{
    Box::new(ContextError::new(context, error))
}

/// Builds an error from a bare message.
pub fn new_error(message: impl Into<String>) -> DynError {
    Box::new(SimpleError::new(message))
}

/// Returns true when the error chain bottoms out in a missing-path I/O error.
/// Context wrappers added along the way are walked through.
pub fn is_not_found_error(err: &(dyn Error + 'static)) -> bool {
    let mut current: Option<&(dyn Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return io_err.kind() == io::ErrorKind::NotFound;
        }
        current = e.source();
    }
    false
}
