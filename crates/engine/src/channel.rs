// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct channel manager (spec.md §4.6): opens worker-to-worker mailboxes
//! with conflict checks, sends messages, and drains pending inboxes with
//! at-most-once delivery semantics. Grounded on `oj-engine`'s
//! `runtime::handlers` dispatch-by-mutation style, generalized from job
//! step handoffs to a two-party channel abstraction with no teacher analog.

use pal_core::{Clock, CoreError, DirectChannel, DirectChannelId, DirectMessage, DirectMessageId, MessageType};
use pal_storage::{Store, StoreEvent};

pub struct DirectChannelManager;

impl DirectChannelManager {
    /// Opens a channel between `session_a` and `session_b`, rejecting it if
    /// an active channel already occupies the same `port_id` slot or the
    /// same unordered session pair within `orchestration_id` (spec.md §3:
    /// "at most one active channel per port_id and per unordered pair
    /// within an orchestration").
    pub fn open<C: Clock>(
        store: &mut Store,
        clock: &C,
        session_a: &str,
        session_b: &str,
        port_id: Option<String>,
        orchestration_id: Option<String>,
    ) -> Result<DirectChannel, CoreError> {
        let conflict = store.query(|s| {
            s.direct_channels
                .values()
                .any(|c| c.conflicts_with(session_a, session_b, port_id.as_deref(), orchestration_id.as_deref()))
        });
        if conflict {
            return Err(CoreError::Conflict {
                reason: format!("an active direct channel already exists for {session_a}/{session_b}"),
            });
        }

        let channel = DirectChannel::new(session_a, session_b, port_id, orchestration_id, clock.epoch_ms());
        store.commit(StoreEvent::DirectChannelOpened { channel: Box::new(channel.clone()) })?;
        Ok(channel)
    }

    /// Closes a still-active channel. Normally this happens implicitly as
    /// part of `SessionEnded`'s apply handler; this is the explicit
    /// admin/API path.
    pub fn close<C: Clock>(store: &mut Store, clock: &C, channel_id: DirectChannelId) -> Result<(), CoreError> {
        let exists = store.query(|s| s.direct_channels.contains_key(&channel_id));
        if !exists {
            return Err(CoreError::NotFound { resource: "direct_channel", id: channel_id.to_string() });
        }
        store.commit(StoreEvent::DirectChannelClosed { channel_id, at_ms: clock.epoch_ms() })?;
        Ok(())
    }

    /// Sends a message on an active channel. `from_session` must be one of
    /// the channel's two participants; the recipient is inferred as the
    /// other side.
    pub fn send<C: Clock>(
        store: &mut Store,
        clock: &C,
        channel_id: DirectChannelId,
        from_session: &str,
        message_type: MessageType,
        payload: serde_json::Value,
    ) -> Result<DirectMessage, CoreError> {
        let channel = store
            .query(|s| s.direct_channels.get(&channel_id).cloned())
            .ok_or_else(|| CoreError::NotFound { resource: "direct_channel", id: channel_id.to_string() })?;
        if channel.status != pal_core::ChannelStatus::Active {
            return Err(CoreError::Conflict { reason: format!("channel {channel_id} is closed") });
        }
        let to_session = channel
            .other(from_session)
            .ok_or_else(|| CoreError::Conflict { reason: format!("{from_session} is not a participant of {channel_id}") })?
            .to_string();

        let message = DirectMessage::new(&channel, from_session, to_session, message_type, payload, clock.epoch_ms());
        store.commit(StoreEvent::DirectMessageSent { message: Box::new(message.clone()) })?;
        Ok(message)
    }

    /// `ReceiveAllPending`: every undelivered message addressed to
    /// `session_id`, oldest first, marking each delivered in the same call
    /// (at-most-once — a message already marked delivered by a concurrent
    /// reader is skipped).
    pub fn receive_all_pending<C: Clock>(
        store: &mut Store,
        clock: &C,
        session_id: &str,
    ) -> Result<Vec<DirectMessage>, CoreError> {
        let mut pending: Vec<DirectMessage> = store.query(|s| {
            s.direct_messages
                .values()
                .filter(|m| m.to_session == session_id && m.is_pending())
                .cloned()
                .collect()
        });
        pending.sort_by_key(|m| m.created_at_ms);

        let now = clock.epoch_ms();
        let mut delivered = Vec::with_capacity(pending.len());
        for message in pending.drain(..) {
            let still_pending = store.query(|s| {
                s.direct_messages.get(&message.id).map(|m| m.is_pending()).unwrap_or(false)
            });
            if !still_pending {
                continue;
            }
            store.commit(StoreEvent::DirectMessageDelivered { message_id: message.id, at_ms: now })?;
            let row = store
                .query(|s| s.direct_messages.get(&message.id).cloned())
                .ok_or_else(|| CoreError::NotFound { resource: "direct_message", id: message.id.to_string() })?;
            delivered.push(row);
        }
        Ok(delivered)
    }

    /// Marks a delivered message as processed by its recipient (acks the
    /// host assistant actually consumed it, distinct from mere delivery).
    pub fn mark_processed<C: Clock>(store: &mut Store, clock: &C, message_id: DirectMessageId) -> Result<(), CoreError> {
        let exists = store.query(|s| s.direct_messages.contains_key(&message_id));
        if !exists {
            return Err(CoreError::NotFound { resource: "direct_message", id: message_id.to_string() });
        }
        store.commit(StoreEvent::DirectMessageProcessed { message_id, at_ms: clock.epoch_ms() })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
