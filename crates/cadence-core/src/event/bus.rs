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

use flume::TrySendError;

/// Manages a generic, thread-safe, bounded event channel.
///
/// The bus keeps its own receiver alive, so publishing can never fail with a
/// disconnected channel. When the buffer is full, new events are dropped.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a new EventBus buffering at most `capacity` events.
    ///
    /// ## Arguments
    /// * `capacity` - The number of undelivered events kept before new ones are dropped.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        log::debug!("EventBus initialized (capacity={}).", capacity);
        Self { sender, receiver }
    }

    /// Publishes an event without blocking.
    ///
    /// ## Returns
    /// `true` if the event was queued, `false` if it was dropped.
    pub fn publish(&self, event: T) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::trace!("EventBus full, dropping event.");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                log::error!("EventBus receiver disconnected, dropping event.");
                false
            }
        }
    }

    /// Returns a clone of the receiving end of the channel.
    ///
    /// Receivers compete for events: each event is delivered to one of them.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        self.receiver.clone()
    }

    /// Returns the number of events waiting to be received.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::{thread, time::Duration};

    /// A local, self-contained event enum for testing purposes.
    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Resized { width: u32, height: u32 },
        Tick(u64),
        Shutdown,
    }

    #[test]
    fn test_publish_and_receive_in_order() {
        let bus = EventBus::<TestEvent>::with_capacity(8);
        let receiver = bus.subscribe();

        assert!(bus.publish(TestEvent::Resized {
            width: 1,
            height: 1,
        }));
        assert!(bus.publish(TestEvent::Tick(3)));
        assert!(bus.publish(TestEvent::Shutdown));
        assert_eq!(bus.pending(), 3);

        let received: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            received,
            vec![
                TestEvent::Resized {
                    width: 1,
                    height: 1
                },
                TestEvent::Tick(3),
                TestEvent::Shutdown
            ]
        );
        assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_full_bus_drops_new_events() {
        let bus = EventBus::<TestEvent>::with_capacity(2);
        assert!(bus.publish(TestEvent::Tick(1)));
        assert!(bus.publish(TestEvent::Tick(2)));
        assert!(!bus.publish(TestEvent::Tick(3)));

        let receiver = bus.subscribe();
        assert_eq!(receiver.try_recv(), Ok(TestEvent::Tick(1)));
        assert_eq!(receiver.try_recv(), Ok(TestEvent::Tick(2)));
        assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_publish_from_thread() {
        let bus = std::sync::Arc::new(EventBus::<TestEvent>::with_capacity(4));
        let receiver = bus.subscribe();
        let remote = bus.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.publish(TestEvent::Tick(42));
        });

        match receiver.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => assert_eq!(event, TestEvent::Tick(42)),
            Err(e) => panic!("Failed to receive event from thread: {e:?}"),
        }
        handle.join().expect("Thread join failed");
    }
}
