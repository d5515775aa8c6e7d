// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct channel + message: a private, durable, ordered message queue
//! between exactly two sessions (spec.md §3/§4.6).
//!
//! Generalizes the teacher's tagged-union addressing idiom (`OwnerId` in
//! `owner.rs`) to a channel-scoped two-party mailbox: a channel's
//! participants are two session IDs rather than an open-ended owner union,
//! since a direct channel is always worker-to-worker.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Random ID for a direct channel row.
    pub struct DirectChannelId("chn-");
}

crate::define_id! {
    /// Random ID for a direct message row.
    pub struct DirectMessageId("dmg-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Active,
    Closed,
}

crate::simple_display! {
    ChannelStatus {
        Active => "active",
        Closed => "closed",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectChannel {
    pub id: DirectChannelId,
    pub session_a: String,
    pub session_b: String,
    pub port_id: Option<String>,
    pub orchestration_id: Option<String>,
    pub status: ChannelStatus,
    pub created_at_ms: u64,
    pub closed_at_ms: Option<u64>,
}

impl DirectChannel {
    pub fn new(
        session_a: impl Into<String>,
        session_b: impl Into<String>,
        port_id: Option<String>,
        orchestration_id: Option<String>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: DirectChannelId::new(),
            session_a: session_a.into(),
            session_b: session_b.into(),
            port_id,
            orchestration_id,
            status: ChannelStatus::Active,
            created_at_ms,
            closed_at_ms: None,
        }
    }

    pub fn has_participant(&self, session_id: &str) -> bool {
        self.session_a == session_id || self.session_b == session_id
    }

    /// The other participant, given one side of the pair.
    pub fn other(&self, session_id: &str) -> Option<&str> {
        if self.session_a == session_id {
            Some(&self.session_b)
        } else if self.session_b == session_id {
            Some(&self.session_a)
        } else {
            None
        }
    }

    /// True if this channel occupies the same (port_id) slot or the same
    /// unordered pair within an orchestration as `other` — used to enforce
    /// "at most one active channel per port_id and per unordered pair within
    /// an orchestration" (spec.md §3).
    pub fn conflicts_with(&self, other_session_a: &str, other_session_b: &str, port_id: Option<&str>, orchestration_id: Option<&str>) -> bool {
        if self.status != ChannelStatus::Active {
            return false;
        }
        if let (Some(p1), Some(p2)) = (self.port_id.as_deref(), port_id) {
            if p1 == p2 {
                return true;
            }
        }
        let same_pair = (self.session_a == other_session_a && self.session_b == other_session_b)
            || (self.session_a == other_session_b && self.session_b == other_session_a);
        if same_pair {
            if let (Some(o1), Some(o2)) = (self.orchestration_id.as_deref(), orchestration_id) {
                return o1 == o2;
            }
        }
        false
    }

    pub fn close(&mut self, now_ms: u64) {
        self.status = ChannelStatus::Closed;
        self.closed_at_ms = Some(now_ms);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Result,
    Feedback,
    Query,
    Ack,
}

crate::simple_display! {
    MessageType {
        Result => "result",
        Feedback => "feedback",
        Query => "query",
        Ack => "ack",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: DirectMessageId,
    pub channel_id: DirectChannelId,
    pub from_session: String,
    pub to_session: String,
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub created_at_ms: u64,
    pub delivered_at_ms: Option<u64>,
    pub processed_at_ms: Option<u64>,
}

impl DirectMessage {
    pub fn new(
        channel: &DirectChannel,
        from_session: impl Into<String>,
        to_session: impl Into<String>,
        message_type: MessageType,
        payload: serde_json::Value,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: DirectMessageId::new(),
            channel_id: channel.id,
            from_session: from_session.into(),
            to_session: to_session.into(),
            message_type,
            payload,
            created_at_ms,
            delivered_at_ms: None,
            processed_at_ms: None,
        }
    }

    /// At-most-once delivery: only marks delivered if not already delivered
    /// (spec.md §4.6, the `delivered_at IS NULL` gate).
    pub fn mark_delivered(&mut self, now_ms: u64) -> bool {
        if self.delivered_at_ms.is_some() {
            return false;
        }
        self.delivered_at_ms = Some(now_ms);
        true
    }

    pub fn mark_processed(&mut self, now_ms: u64) -> bool {
        if self.delivered_at_ms.is_none() || self.processed_at_ms.is_some() {
            return false;
        }
        self.processed_at_ms = Some(now_ms);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.delivered_at_ms.is_none()
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
