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

//! Provides the primitives for event-driven notification.
//!
//! The primary component is the [`EventBus`], a generic, named-channel
//! publish/subscribe fan-out. Channels are identified by structured keys
//! rather than concatenated strings: the registry uses [`EventKey`]
//! (verb + target), descriptors use
//! [`DescriptorTopic`](crate::asset::DescriptorTopic).

mod bus;
mod channel;

pub use self::bus::{EventBus, SubscriptionId};
pub use self::channel::{EventKey, RegistryEvent, Target, Verb};
