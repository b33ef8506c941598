use heapless::Deque;

use super::{InputEvent, InputProvider};

/// Pre-scripted input source for host tests and bring-up.
#[derive(Debug)]
pub struct MockInput {
    queue: Deque<InputEvent, 64>,
}

impl MockInput {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// Queue an event; silently dropped once the script is full.
    pub fn push(&mut self, event: InputEvent) {
        let _ = self.queue.push_back(event);
    }

    pub fn extend<I: IntoIterator<Item = InputEvent>>(&mut self, events: I) {
        for event in events {
            self.push(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for MockInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputProvider for MockInput {
    type Error = core::convert::Infallible;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        Ok(self.queue.pop_front())
    }
}
