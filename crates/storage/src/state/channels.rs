// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct channel + message handlers (spec.md §3/§4.6). Delivery is
//! at-most-once: the apply function only sets `delivered_at`/`processed_at`
//! if they are currently unset, mirroring the `delivered_at IS NULL` gate.

use super::MaterializedState;
use crate::event::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::DirectChannelOpened { channel } => {
            state.direct_channels.entry(channel.id).or_insert_with(|| (**channel).clone());
        }

        StoreEvent::DirectChannelClosed { channel_id, at_ms } => {
            if let Some(channel) = state.direct_channels.get_mut(channel_id) {
                if channel.status == pal_core::ChannelStatus::Active {
                    channel.close(*at_ms);
                }
            }
        }

        StoreEvent::DirectMessageSent { message } => {
            state.direct_messages.entry(message.id).or_insert_with(|| (**message).clone());
        }

        StoreEvent::DirectMessageDelivered { message_id, at_ms } => {
            if let Some(message) = state.direct_messages.get_mut(message_id) {
                message.mark_delivered(*at_ms);
            }
        }

        StoreEvent::DirectMessageProcessed { message_id, at_ms } => {
            if let Some(message) = state.direct_messages.get_mut(message_id) {
                message.mark_processed(*at_ms);
            }
        }

        _ => {}
    }
}
