// Copyright 2025 eraflo
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

//! Defines the error reported by a render target when a paint attempt fails.

use std::any::Any;
use std::fmt;

/// An error raised while a [`RenderTarget`](crate::RenderTarget) paints.
///
/// Paint errors are always isolated to the target that produced them: the
/// scheduler logs them and retries the target on the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintError {
    /// The underlying surface was destroyed or is no longer realized.
    SurfaceLost,
    /// An error originating from the host's drawing backend.
    Backend(String),
    /// The paint call panicked. Carries the panic message when one was available.
    Panicked(String),
}

impl PaintError {
    /// Builds a [`PaintError::Panicked`] from the payload of a caught panic.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        PaintError::Panicked(message)
    }
}

impl fmt::Display for PaintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaintError::SurfaceLost => write!(f, "Render surface is no longer available"),
            PaintError::Backend(msg) => write!(f, "Backend paint error: {msg}"),
            PaintError::Panicked(msg) => write!(f, "Paint panicked: {msg}"),
        }
    }
}

impl std::error::Error for PaintError {}
