use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::view::{View, ViewEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Error,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    pub fn new(kind: BannerKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// The one transient message area. Showing a banner replaces whatever is
/// there; each banner clears itself after `lifetime` unless replaced first.
pub struct BannerSlot {
    lifetime: Duration,
    current: Arc<Mutex<Option<(u64, Banner)>>>,
    next_id: AtomicU64,
}

impl BannerSlot {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            current: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn show<V: View>(&self, view: &V, banner: Banner) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *self.current.lock() = Some((id, banner.clone()));
        view.render(ViewEvent::Banner(banner));

        let lifetime = self.lifetime;
        let slot = Arc::clone(&self.current);
        let view = view.clone();
        tokio::spawn(async move {
            tokio::time::sleep(lifetime).await;
            let expired = {
                let mut current = slot.lock();
                match current.as_ref() {
                    Some((shown, _)) if *shown == id => current.take().is_some(),
                    _ => false,
                }
            };
            if expired {
                view.render(ViewEvent::BannerCleared);
            }
        });
    }

    pub fn current(&self) -> Option<Banner> {
        self.current.lock().as_ref().map(|(_, banner)| banner.clone())
    }
}
