// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session event handlers.

use super::{MaterializedState, SessionEvent};
use crate::event::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::SessionCreated { session } => {
            state.sessions.entry(session.id.clone()).or_insert_with(|| (**session).clone());
        }

        StoreEvent::SessionRenamed { session_id, title } => {
            if let Some(session) = state.sessions.get_mut(session_id.as_str()) {
                session.title = title.clone();
            }
        }

        StoreEvent::SessionUsageUpdated {
            session_id,
            input,
            output,
            cache_read,
            cache_create,
            cost_usd,
        } => {
            if let Some(session) = state.sessions.get_mut(session_id.as_str()) {
                session.update_usage(*input, *output, *cache_read, *cache_create, *cost_usd);
            }
        }

        StoreEvent::SessionCompacted { session_id, at_ms } => {
            if let Some(session) = state.sessions.get_mut(session_id.as_str()) {
                // Guards the counter so replaying the same event twice
                // does not double-increment it.
                if session.last_compact_at != Some(*at_ms) {
                    session.increment_compact(*at_ms);
                }
            }
        }

        StoreEvent::SessionEnded {
            session_id,
            status,
            summary,
            at_ms,
        } => {
            if let Some(session) = state.sessions.get_mut(session_id.as_str()) {
                session.end(*status, summary.clone(), *at_ms);
            }
            for channel in state.direct_channels.values_mut() {
                if channel.has_participant(session_id) && channel.status == pal_core::ChannelStatus::Active {
                    channel.close(*at_ms);
                }
            }
            state.locks.retain(|_, lock| &lock.session_id != session_id);
        }

        StoreEvent::SessionAttentionRatioObserved { session_id, ratio } => {
            if let Some(session) = state.sessions.get_mut(session_id.as_str()) {
                session.last_attention_ratio = *ratio;
            }
        }

        StoreEvent::SessionActivePortSet { session_id, port_id } => {
            if let Some(session) = state.sessions.get_mut(session_id.as_str()) {
                session.active_port = port_id.clone();
            }
        }

        StoreEvent::SessionEventLogged {
            session_id,
            event_type,
            event_data,
            at_ms,
        } => {
            state.session_events.entry(session_id.clone()).or_default().push(SessionEvent {
                event_type: event_type.clone(),
                event_data: event_data.clone(),
                created_at_ms: *at_ms,
            });
        }

        _ => {}
    }
}
