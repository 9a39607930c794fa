//! Subscribed-channel refresh bookkeeping.

use std::collections::HashSet;
use tracing::debug;

/// Refresh state for one subscribed channel.
#[derive(Debug, Clone)]
pub struct ChannelEntry {
    pub channel_id: String,
    /// Epoch of the last refresh attempt, 0 = never.
    pub last_updated_at: i64,
    pub banned: bool,
}

/// Per-channel polling cadence, kept in registration order.
#[derive(Debug, Default)]
pub struct ChannelTracker {
    entries: Vec<ChannelEntry>,
}

impl ChannelTracker {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    /// Materialize entries for subscribed channels not seen yet, refresh ban
    /// flags and drop channels no longer subscribed.
    pub fn sync(&mut self, subscribed: &[String], banned: &HashSet<String>) {
        for channel_id in subscribed {
            if !self.entries.iter().any(|e| &e.channel_id == channel_id) {
                debug!("tracking subscribed channel {}", channel_id);
                self.entries.push(ChannelEntry {
                    channel_id: channel_id.clone(),
                    last_updated_at: 0,
                    banned: false,
                });
            }
        }
        self.entries
            .retain(|e| subscribed.iter().any(|s| s == &e.channel_id));
        for entry in &mut self.entries {
            entry.banned = banned.contains(&entry.channel_id);
        }
    }

    /// First channel due for a refresh. None is the normal steady state, not
    /// an error.
    pub fn next_due(&self, now: i64, poll_secs: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| {
                !e.banned && (e.last_updated_at == 0 || now > e.last_updated_at + poll_secs)
            })
            .map(|e| e.channel_id.as_str())
    }

    /// Stamp a refresh attempt, successful or not, so a broken channel
    /// cannot monopolize the scheduler.
    pub fn mark_attempt(&mut self, channel_id: &str, now: i64) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.channel_id == channel_id) {
            entry.last_updated_at = now;
        }
    }
}
