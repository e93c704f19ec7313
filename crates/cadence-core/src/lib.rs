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

//! # Cadence Core
//!
//! Foundational crate containing the traits, core types, and interface
//! contracts shared between the active render scheduler and its hosts.
//!
//! Hosts implement [`RenderTarget`] for their paintable surfaces and
//! [`UiThread`] for their toolkit's event thread; the scheduler consumes both.

#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod event;
pub mod handler;
pub mod target;
pub mod ui_thread;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::PaintError;
pub use event::EventBus;
pub use handler::{FrameHandler, HandlerId};
pub use target::{RenderTarget, TargetId};
pub use ui_thread::{ChannelUiThread, ImmediateUiThread, TaskPump, UiTask, UiThread};
