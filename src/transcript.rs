//! Append-only message log with delayed reveal
//!
//! Messages are committed immediately but only become visible once their
//! reveal instant has passed. Reveal instants never go backwards, so the
//! visible order always equals the commit order.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Assistant,
}

/// A visible transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub origin: Origin,
    pub timestamp: DateTime<Utc>,
}

/// A committed message waiting for its reveal instant
#[derive(Debug, Clone)]
struct ScheduledReveal {
    id: u64,
    text: String,
    origin: Origin,
    reveal_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Transcript {
    revealed: Vec<Message>,
    pending: VecDeque<ScheduledReveal>,
    next_id: u64,
    /// Latest reveal instant handed out, the floor for the next one
    last_reveal_at: Option<DateTime<Utc>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a message to appear `delay` after `now`.
    ///
    /// Returns the message if it became visible straight away (zero delay and
    /// nothing queued ahead of it).
    pub fn commit(
        &mut self,
        text: impl Into<String>,
        origin: Origin,
        delay: Duration,
        now: DateTime<Utc>,
    ) -> Option<Message> {
        self.next_id += 1;
        let id = self.next_id;
        let mut reveal_at = now + TimeDelta::from_std(delay).unwrap_or(TimeDelta::zero());
        if let Some(floor) = self.last_reveal_at {
            reveal_at = reveal_at.max(floor);
        }
        self.last_reveal_at = Some(reveal_at);

        let scheduled = ScheduledReveal {
            id,
            text: text.into(),
            origin,
            reveal_at,
        };

        if self.pending.is_empty() && delay.is_zero() {
            let message = Self::reveal(scheduled);
            self.revealed.push(message.clone());
            return Some(message);
        }
        self.pending.push_back(scheduled);
        None
    }

    /// Move every message whose reveal instant has passed into the visible log
    pub fn reveal_due(&mut self, now: DateTime<Utc>) -> Vec<Message> {
        let mut newly = Vec::new();
        while self.pending.front().is_some_and(|s| s.reveal_at <= now) {
            if let Some(scheduled) = self.pending.pop_front() {
                let message = Self::reveal(scheduled);
                self.revealed.push(message.clone());
                newly.push(message);
            }
        }
        newly
    }

    /// Reveal everything regardless of schedule
    pub fn flush(&mut self) -> Vec<Message> {
        let Some(last) = self.pending.back().map(|s| s.reveal_at) else {
            return Vec::new();
        };
        self.reveal_due(last)
    }

    pub fn next_reveal_at(&self) -> Option<DateTime<Utc>> {
        self.pending.front().map(|s| s.reveal_at)
    }

    pub fn messages(&self) -> &[Message] {
        &self.revealed
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Committed messages, visible or not
    #[allow(dead_code)] // Used in tests
    pub fn committed_count(&self) -> usize {
        self.revealed.len() + self.pending.len()
    }

    fn reveal(scheduled: ScheduledReveal) -> Message {
        Message {
            id: scheduled.id,
            text: scheduled.text,
            origin: scheduled.origin,
            timestamp: scheduled.reveal_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_zero_delay_reveals_immediately() {
        let mut transcript = Transcript::new();
        let shown = transcript.commit("hi", Origin::User, Duration::ZERO, t0());
        assert!(shown.is_some());
        assert_eq!(transcript.messages().len(), 1);
        assert_eq!(transcript.pending_count(), 0);
    }

    #[test]
    fn test_delayed_message_waits() {
        let mut transcript = Transcript::new();
        let shown = transcript.commit("hello", Origin::Assistant, Duration::from_millis(500), t0());
        assert!(shown.is_none());
        assert!(transcript.messages().is_empty());

        assert!(transcript
            .reveal_due(t0() + TimeDelta::milliseconds(499))
            .is_empty());
        let revealed = transcript.reveal_due(t0() + TimeDelta::milliseconds(500));
        assert_eq!(revealed.len(), 1);
        assert_eq!(revealed[0].timestamp, t0() + TimeDelta::milliseconds(500));
    }

    #[test]
    fn test_reveal_order_matches_commit_order() {
        let mut transcript = Transcript::new();
        transcript.commit("slow", Origin::Assistant, Duration::from_millis(1000), t0());
        transcript.commit("fast", Origin::Assistant, Duration::from_millis(100), t0());
        transcript.commit("user", Origin::User, Duration::ZERO, t0());

        // Nothing can jump ahead of the slow message
        assert!(transcript
            .reveal_due(t0() + TimeDelta::milliseconds(200))
            .is_empty());

        let revealed = transcript.reveal_due(t0() + TimeDelta::seconds(1));
        let texts: Vec<_> = revealed.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["slow", "fast", "user"]);

        let ids: Vec<_> = transcript.messages().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(transcript
            .messages()
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_flush_reveals_everything() {
        let mut transcript = Transcript::new();
        transcript.commit("a", Origin::Assistant, Duration::from_secs(5), t0());
        transcript.commit("b", Origin::Assistant, Duration::from_secs(1), t0());
        assert_eq!(transcript.committed_count(), 2);
        assert_eq!(transcript.flush().len(), 2);
        assert_eq!(transcript.next_reveal_at(), None);
    }
}
