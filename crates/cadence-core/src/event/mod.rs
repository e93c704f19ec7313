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

//! Provides foundational primitives for event-driven communication.
//!
//! The [`EventBus`] is a generic, bounded, thread-safe channel. Publishing
//! never blocks: a hot loop such as the render scheduler can report what it
//! is doing without ever waiting on a slow or absent consumer.
//!
//! Keeping the bus generic lets `cadence-control` define its own event type
//! without `cadence-core` knowing about it.

mod bus;

pub use self::bus::EventBus;
