use crate::windows::DisplayState;
use pinshell_manifest::{AppId, WindowId};
use std::sync::Mutex;

/// Notifications the core emits for the UI chrome to react to, replacing
/// the DOM custom events of a browser shell with an explicit in-process bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    AppPinned { id: AppId },
    AppUnpinned { id: AppId },
    DisplayChanged { window_id: WindowId, mode: DisplayState },
}

type Handler = Box<dyn Fn(&ShellEvent) + Send + Sync>;

/// Process-wide publish/subscribe channel for [`ShellEvent`]s.
///
/// Handlers run synchronously on the publishing thread, in subscription
/// order. Intended to be shared behind an `Arc` by whoever needs to emit
/// or observe shell state changes.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: impl Fn(&ShellEvent) + Send + Sync + 'static) {
        let mut handlers = self
            .handlers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        handlers.push(Box::new(handler));
    }

    pub fn publish(&self, event: &ShellEvent) {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for handler in handlers.iter() {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            bus.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        bus.publish(&ShellEvent::AppPinned {
            id: AppId::new("https://x.test/app/"),
        });
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn events_carry_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        let event = ShellEvent::DisplayChanged {
            window_id: WindowId::new("w1"),
            mode: DisplayState::Standalone,
        };
        bus.publish(&event);
        assert_eq!(seen.lock().unwrap().as_slice(), &[event]);
    }
}
