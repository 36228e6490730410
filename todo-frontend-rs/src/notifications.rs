//! # Notifications
//! [`Notifier`] is the fan-out point: whoever wants to tell the user something calls `emit`, and the single
//! registered handler (usually a [`Toasts`] tray) receives it synchronously. With no handler the message is dropped.
//!
//! [`Toasts`] keeps the visible notifications. Each one expires after [`Toasts::DISPLAY_DURATION`] unless dismissed first.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub text: String,
}

type Handler = Rc<dyn Fn(&Notification)>;

#[derive(Clone, Default)]
pub struct Notifier {
    handler: Rc<RefCell<Option<Handler>>>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("has_handler", &self.handler.borrow().is_some())
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previously registered handler.
    pub fn set_handler(&self, handler: impl Fn(&Notification) + 'static) {
        *self.handler.borrow_mut() = Some(Rc::new(handler));
    }

    pub fn clear_handler(&self) {
        *self.handler.borrow_mut() = None;
    }

    pub fn emit(&self, kind: NotificationKind, text: impl Into<String>) {
        let notification = Notification {
            kind,
            text: text.into(),
        };
        // release the borrow before calling out, the handler may re-register itself
        let handler = self.handler.borrow().clone();
        match handler {
            Some(handler) => handler(&notification),
            None => log::debug!("No notification handler, dropping {notification:?}"),
        }
    }

    pub fn error(&self, text: impl Into<String>) {
        self.emit(NotificationKind::Error, text);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.emit(NotificationKind::Success, text);
    }

    pub fn info(&self, text: impl Into<String>) {
        self.emit(NotificationKind::Info, text);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub shown_at: i64,
}

#[derive(Clone, Default)]
pub struct Toasts {
    inner: Rc<RefCell<ToastsInner>>,
}

#[derive(Default)]
struct ToastsInner {
    visible: Vec<Toast>,
    expiry_timers: HashMap<NotificationId, JoinHandle<()>>,
}

impl fmt::Debug for Toasts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.borrow().visible.iter()).finish()
    }
}

impl Toasts {
    pub const DISPLAY_DURATION: Duration = Duration::from_secs(5);

    pub fn new() -> Self {
        Self::default()
    }

    /// Registers this tray as `notifier`'s handler. The notifier only keeps a weak reference.
    pub fn attach(&self, notifier: &Notifier) {
        let tray = Rc::downgrade(&self.inner);
        notifier.set_handler(move |notification| {
            if let Some(inner) = tray.upgrade() {
                Toasts { inner }.push(notification.kind, notification.text.clone());
            }
        });
    }

    /// Must be called from inside a `LocalSet`, which drives the expiry timer.
    pub fn push(&self, kind: NotificationKind, text: impl Into<String>) -> NotificationId {
        let id = NotificationId(eyedee::notification_id());
        let toast = Toast {
            id: id.clone(),
            kind,
            text: text.into(),
            shown_at: todo_model::now_millis(),
        };

        let tray: Weak<RefCell<ToastsInner>> = Rc::downgrade(&self.inner);
        let expiring = id.clone();
        let timer = tokio::task::spawn_local(async move {
            tokio::time::sleep(Self::DISPLAY_DURATION).await;
            if let Some(inner) = tray.upgrade() {
                Toasts { inner }.remove(&expiring);
            }
        });

        let mut inner = self.inner.borrow_mut();
        inner.visible.push(toast);
        inner.expiry_timers.insert(id.clone(), timer);
        id
    }

    /// Hides the toast now and cancels its expiry. Returns false if it was already gone.
    pub fn dismiss(&self, id: &NotificationId) -> bool {
        if let Some(timer) = self.inner.borrow_mut().expiry_timers.remove(id) {
            timer.abort();
        }
        self.remove(id)
    }

    /// Visible toasts, oldest first.
    pub fn current(&self) -> Vec<Toast> {
        self.inner.borrow().visible.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_pending_expiry(&self, id: &NotificationId) -> bool {
        self.inner.borrow().expiry_timers.contains_key(id)
    }

    fn remove(&self, id: &NotificationId) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.expiry_timers.remove(id);
        let before = inner.visible.len();
        inner.visible.retain(|toast| &toast.id != id);
        inner.visible.len() != before
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tokio::task::LocalSet;

    use super::*;

    #[test]
    fn test_emit_without_handler_is_dropped() {
        let notifier = Notifier::new();
        notifier.error("nobody listens");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        notifier.set_handler(move |n| sink.borrow_mut().push(n.clone()));
        notifier.success("saved");

        assert_eq!(
            *seen.borrow(),
            vec![Notification {
                kind: NotificationKind::Success,
                text: "saved".to_string()
            }]
        );
    }

    #[test]
    fn test_last_handler_wins() {
        let notifier = Notifier::new();
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let counter = first.clone();
        notifier.set_handler(move |_| counter.set(counter.get() + 1));
        let counter = second.clone();
        notifier.set_handler(move |_| counter.set(counter.get() + 1));

        notifier.info("hello");
        notifier.clone().error("again");
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 2);

        notifier.clear_handler();
        notifier.info("dropped");
        assert_eq!(second.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toasts_expire() {
        LocalSet::new()
            .run_until(async {
                let notifier = Notifier::new();
                let toasts = Toasts::new();
                toasts.attach(&notifier);

                notifier.error("Update failed: Simulated server error (update)");
                assert_eq!(toasts.len(), 1);
                assert_eq!(toasts.current()[0].kind, NotificationKind::Error);

                tokio::time::sleep(Toasts::DISPLAY_DURATION - Duration::from_millis(1)).await;
                assert_eq!(toasts.len(), 1);

                tokio::time::sleep(Duration::from_millis(2)).await;
                tokio::task::yield_now().await;
                assert!(toasts.is_empty());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_expiry() {
        LocalSet::new()
            .run_until(async {
                let toasts = Toasts::new();
                let first = toasts.push(NotificationKind::Info, "first");
                let second = toasts.push(NotificationKind::Success, "second");
                assert_ne!(first, second);

                assert!(toasts.dismiss(&first));
                assert!(!toasts.has_pending_expiry(&first));
                assert!(!toasts.dismiss(&first));

                let texts: Vec<_> = toasts.current().into_iter().map(|t| t.text).collect();
                assert_eq!(texts, vec!["second"]);

                tokio::time::sleep(Toasts::DISPLAY_DURATION * 2).await;
                assert!(toasts.is_empty());
                assert!(!toasts.has_pending_expiry(&second));
            })
            .await;
    }
}
