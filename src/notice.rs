use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

const RECENT_CAPACITY: usize = 20;
const BROADCAST_CAPACITY: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Transient messages for the admin, kept until polled and broadcast to
/// anyone subscribed.
#[derive(Debug)]
pub struct Notices {
    recent: Mutex<VecDeque<Notice>>,
    sender: broadcast::Sender<Notice>,
}

impl Notices {
    pub fn new() -> Notices {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Notices {
            recent: Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY)),
            sender,
        }
    }

    pub fn push(&self, level: NoticeLevel, title: &str, description: String) {
        let notice = Notice {
            level,
            title: title.to_string(),
            description,
            created_at: Utc::now(),
        };

        {
            let mut recent = self.recent();
            if recent.len() == RECENT_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(notice.clone());
        }

        let _ = self.sender.send(notice);
    }

    pub fn success(&self, title: &str, description: String) {
        self.push(NoticeLevel::Success, title, description);
    }

    pub fn error(&self, title: &str, description: String) {
        self.push(NoticeLevel::Error, title, description);
    }

    /// Takes every notice not yet seen, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.recent().drain(..).collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    fn recent(&self) -> MutexGuard<'_, VecDeque<Notice>> {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Notices {
    fn default() -> Notices {
        Notices::new()
    }
}
