use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::store::ChannelKey;
use crate::sync::{IPushChannel, IRowStore, Row, SyncError};

// テストとローカルモード用のインメモリ行ストア
// 書き込みは購読者全員 (書き込み元も含む) へ 1 回ずつエコーされる
#[derive(Clone)]
pub struct MemoryRowStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    rows: HashMap<String, serde_json::Value>,
    subscribers: Vec<mpsc::UnboundedSender<Row>>,
    upsert_count: usize,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                rows: HashMap::new(),
                subscribers: Vec::new(),
                upsert_count: 0,
            })),
        }
    }

    pub fn subscribe(&self) -> MemoryPushChannel {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().subscribers.push(sender);
        MemoryPushChannel { receiver }
    }

    pub fn row(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.lock().unwrap().rows.get(key).cloned()
    }

    pub fn upsert_count(&self) -> usize {
        self.inner.lock().unwrap().upsert_count
    }
}

impl Default for MemoryRowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IRowStore for MemoryRowStore {
    async fn fetch_row(&self, key: ChannelKey) -> Result<Option<Row>, SyncError> {
        let inner = self.inner.lock().unwrap();
        let row = inner.rows.get(key.as_str()).map(|value| Row {
            key: key.as_str().to_string(),
            value: value.clone(),
        });

        Ok(row)
    }

    async fn upsert_row(&self, row: Row) -> Result<(), SyncError> {
        let mut inner = self.inner.lock().unwrap();
        inner.rows.insert(row.key.clone(), row.value.clone());
        inner.upsert_count += 1;

        // 切断済みの購読者はここで取り除く
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(row.clone()).is_ok());

        Ok(())
    }
}

pub struct MemoryPushChannel {
    receiver: mpsc::UnboundedReceiver<Row>,
}

impl IPushChannel for MemoryPushChannel {
    async fn next_change(&mut self) -> Option<Row> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryRowStore;
    use crate::store::ChannelKey;
    use crate::sync::{IPushChannel, IRowStore, Row};

    #[tokio::test]
    async fn upsert_reaches_every_subscriber() {
        let store = MemoryRowStore::new();
        let mut first = store.subscribe();
        let mut second = store.subscribe();

        let row = Row::new(ChannelKey::Users, serde_json::json!([]));
        store.upsert_row(row.clone()).await.unwrap();

        assert_eq!(first.next_change().await.unwrap(), row);
        assert_eq!(second.next_change().await.unwrap(), row);
    }

    #[tokio::test]
    async fn fetch_returns_last_written_value() {
        let store = MemoryRowStore::new();
        assert!(store
            .fetch_row(ChannelKey::Bands)
            .await
            .unwrap()
            .is_none());

        let row = Row::new(ChannelKey::Bands, serde_json::json!([1, 2]));
        store.upsert_row(row.clone()).await.unwrap();

        let fetched = store.fetch_row(ChannelKey::Bands).await.unwrap().unwrap();
        assert_eq!(fetched, row);
    }
}
