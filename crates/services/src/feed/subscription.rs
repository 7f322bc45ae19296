use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bson::{oid::ObjectId, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::store::{Query, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub id: ObjectId,
    pub kind: ChangeKind,
}

/// The full result set of a live query plus what changed since the previous
/// snapshot. The first snapshot reports every item as added.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub changes: Vec<DocumentChange>,
}

/// A live query. Snapshots arrive through `next`; dropping the subscription
/// stops the background task.
pub struct Subscription<T> {
    rx: mpsc::Receiver<Snapshot<T>>,
    task: JoinHandle<()>,
}

impl<T> Subscription<T> {
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        self.rx.recv().await
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Changes between two ordered result sets. Added and modified ids follow the
/// order of `current`; removed ids follow `previous`.
pub fn diff(previous: &[(ObjectId, Document)], current: &[(ObjectId, Document)]) -> Vec<DocumentChange> {
    let before: HashMap<ObjectId, &Document> = previous.iter().map(|(id, d)| (*id, d)).collect();
    let mut changes = Vec::new();

    for (id, doc) in current {
        match before.get(id) {
            None => changes.push(DocumentChange { id: *id, kind: ChangeKind::Added }),
            Some(old) if *old != doc => changes.push(DocumentChange {
                id: *id,
                kind: ChangeKind::Modified,
            }),
            Some(_) => {}
        }
    }

    let after: HashSet<ObjectId> = current.iter().map(|(id, _)| *id).collect();
    for (id, _) in previous {
        if !after.contains(id) {
            changes.push(DocumentChange { id: *id, kind: ChangeKind::Removed });
        }
    }
    changes
}

fn keyed(docs: Vec<Document>) -> Vec<(ObjectId, Document)> {
    docs.into_iter()
        .filter_map(|doc| doc.get_object_id("_id").ok().map(|id| (id, doc)))
        .collect()
}

fn decode<T: DeserializeOwned>(docs: &[(ObjectId, Document)]) -> Result<Vec<T>, bson::de::Error> {
    docs.iter()
        .map(|(_, doc)| bson::from_document(doc.clone()))
        .collect()
}

/// Starts a live query. `build` is called before every refresh so time-based
/// bounds such as "start of today" stay current.
pub fn spawn<T, F>(store: Arc<dyn RecordStore>, build: F, capacity: usize) -> Subscription<T>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn() -> Query + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(store, build, tx));
    Subscription { rx, task }
}

async fn run<T, F>(
    store: Arc<dyn RecordStore>,
    build: F,
    tx: mpsc::Sender<Snapshot<T>>,
) where
    T: DeserializeOwned + Send + 'static,
    F: Fn() -> Query + Send + 'static,
{
    // Subscribe before the first read so no write slips between the two
    let mut changes = store.changes();
    let collection = build().collection;
    let mut previous: Option<Vec<(ObjectId, Document)>> = None;

    loop {
        let query = build();
        match store.find(&query).await {
            Ok(docs) => {
                let current = keyed(docs);
                if previous.as_ref() != Some(&current) {
                    let delta = diff(previous.as_deref().unwrap_or(&[]), &current);
                    match decode(&current) {
                        Ok(items) => {
                            if tx.send(Snapshot { items, changes: delta }).await.is_err() {
                                return;
                            }
                            previous = Some(current);
                        }
                        Err(e) => warn!(collection = %collection, error = %e, "Feed item failed to decode"),
                    }
                }
            }
            Err(e) => warn!(collection = %collection, error = %e, "Feed query failed"),
        }

        loop {
            tokio::select! {
                _ = tx.closed() => return,
                event = changes.recv() => match event {
                    Ok(event) if event.collection == collection => break,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(collection = %collection, skipped, "Feed lagged, refreshing");
                        break;
                    }
                    Err(RecvError::Closed) => return,
                },
            }
        }
    }
}
