use alumnet_services::FeedKind;
use axum::extract::ws::{Message, WebSocket};
use bson::oid::ObjectId;
use dashmap::DashMap;
use futures::stream::SplitSink;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Tracks all active WebSocket connections by user ID, plus the feed
/// forwarders each connection has subscribed to.
/// Each user can have multiple connections (multiple tabs/devices).
pub struct WsStorage {
    connections: DashMap<ObjectId, Vec<(String, WsSender)>>,
    feeds: DashMap<String, HashMap<FeedKind, JoinHandle<()>>>,
}

impl WsStorage {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            feeds: DashMap::new(),
        }
    }

    pub fn add(&self, user_id: ObjectId, connection_id: String, sender: WsSender) {
        self.connections
            .entry(user_id)
            .or_default()
            .push((connection_id, sender));
    }

    /// Drops the connection and stops every feed it was subscribed to.
    pub fn remove(&self, user_id: &ObjectId, connection_id: &str) {
        if let Some(mut senders) = self.connections.get_mut(user_id) {
            senders.retain(|(id, _)| id != connection_id);
            if senders.is_empty() {
                drop(senders);
                self.connections.remove(user_id);
            }
        }
        if let Some((_, feeds)) = self.feeds.remove(connection_id) {
            for handle in feeds.into_values() {
                handle.abort();
            }
        }
    }

    pub fn get_senders(&self, user_id: &ObjectId) -> Vec<WsSender> {
        self.connections
            .get(user_id)
            .map(|s| s.iter().map(|(_, sender)| sender.clone()).collect())
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.connections
            .iter()
            .map(|r| r.value().len())
            .sum()
    }

    /// Registers a feed forwarder, replacing (and stopping) any previous one
    /// for the same feed on this connection.
    pub fn set_feed(&self, connection_id: &str, kind: FeedKind, handle: JoinHandle<()>) {
        let previous = self
            .feeds
            .entry(connection_id.to_string())
            .or_default()
            .insert(kind, handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Returns false when the connection was not subscribed to `kind`.
    pub fn drop_feed(&self, connection_id: &str, kind: FeedKind) -> bool {
        let removed = self
            .feeds
            .get_mut(connection_id)
            .and_then(|mut feeds| feeds.remove(&kind));
        match removed {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn feed_count(&self, connection_id: &str) -> usize {
        self.feeds.get(connection_id).map(|f| f.len()).unwrap_or(0)
    }
}

impl Default for WsStorage {
    fn default() -> Self {
        Self::new()
    }
}
