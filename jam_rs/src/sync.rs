use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{ChannelKey, StateStore};
use crate::{Band, User};

// 共有行ストアの 1 行。value は対象コレクションの JSON 配列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub key: String,
    pub value: serde_json::Value,
}

impl Row {
    pub fn new(key: ChannelKey, value: serde_json::Value) -> Self {
        Self {
            key: key.as_str().to_string(),
            value,
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// 行ストアへの読み書き
#[allow(async_fn_in_trait)]
pub trait IRowStore {
    async fn fetch_row(&self, key: ChannelKey) -> Result<Option<Row>, SyncError>;

    async fn upsert_row(&self, row: Row) -> Result<(), SyncError>;
}

// 行ストア上の変更通知。at-least-once で、同じ値の再配送もありうる
#[allow(async_fn_in_trait)]
pub trait IPushChannel {
    // None はチャンネルの終了
    async fn next_change(&mut self) -> Option<Row>;
}

// 内容指紋。競合解決には使わず、無駄な往復の抑制にだけ使う
pub fn fingerprint_of(value: &serde_json::Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    hasher.finish()
}

// StateStore と共有行ストアの橋渡し
// キーごとの最終指紋でエコーを握りつぶし、ローカル変更だけを上流へ流す
pub struct SyncEngine {
    last_fingerprint: HashMap<ChannelKey, u64>,

    // ブートストラップ中は送信を完全に止める
    bootstrapping: bool,

    synchronized: bool,

    // ストアが空か到達不能なときに使うローカル生成ロースター
    fallback_users: Vec<User>,
}

impl SyncEngine {
    pub fn new(fallback_users: Vec<User>) -> Self {
        Self {
            last_fingerprint: HashMap::new(),
            bootstrapping: true,
            synchronized: false,
            fallback_users,
        }
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.bootstrapping
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    // 起動時に全行を一度だけ読み込む
    // 失敗してもプロセスは落とさず、デモロースターで非同期モードに入る
    pub async fn bootstrap<TStore: IRowStore>(&mut self, store: &mut StateStore, client: &TStore) {
        let fetched = futures::future::try_join3(
            client.fetch_row(ChannelKey::Users),
            client.fetch_row(ChannelKey::Bands),
            client.fetch_row(ChannelKey::History),
        )
        .await;

        let (users_row, bands_row, history_row) = match fetched {
            Ok(rows) => rows,
            Err(error) => {
                log::warn!("bootstrap failed, falling back to local roster: {error}");
                store.replace_users(self.fallback_users.clone());
                self.bootstrapping = false;
                self.synchronized = false;
                return;
            }
        };

        let mut loaded_users = false;
        if let Some(row) = users_row {
            if let Some(users) = parse_collection::<User>(ChannelKey::Users, &row.value) {
                loaded_users = !users.is_empty();
                self.last_fingerprint
                    .insert(ChannelKey::Users, fingerprint_of(&row.value));
                store.replace_users(users);
            }
        }
        if let Some(row) = bands_row {
            if let Some(bands) = parse_collection::<Band>(ChannelKey::Bands, &row.value) {
                self.last_fingerprint
                    .insert(ChannelKey::Bands, fingerprint_of(&row.value));
                store.replace_bands(bands);
            }
        }
        if let Some(row) = history_row {
            if let Some(history) = parse_collection::<Band>(ChannelKey::History, &row.value) {
                self.last_fingerprint
                    .insert(ChannelKey::History, fingerprint_of(&row.value));
                store.replace_history(history);
            }
        }

        // ロースターが空ならデモデータを敷く
        // 本物のローカル変更が起きるまで上流には流さない
        if !loaded_users {
            log::info!("users collection empty, seeding local roster");
            store.replace_users(self.fallback_users.clone());
        }

        self.bootstrapping = false;
        self.synchronized = true;
    }

    // 受信値の採用。採用したら true
    pub fn absorb(&mut self, store: &mut StateStore, row: &Row) -> bool {
        let Some(key) = ChannelKey::parse(&row.key) else {
            log::debug!("ignoring change for unknown key {}", row.key);
            return false;
        };

        let fingerprint = fingerprint_of(&row.value);
        if self.last_fingerprint.get(&key) == Some(&fingerprint) {
            // 自分のエコーか、同じ値の再配送
            return false;
        }

        match key {
            ChannelKey::Users => {
                let Some(users) = parse_collection::<User>(key, &row.value) else {
                    return false;
                };
                store.replace_users(users);
            }
            ChannelKey::Bands => {
                let Some(bands) = parse_collection::<Band>(key, &row.value) else {
                    return false;
                };
                store.replace_bands(bands);
            }
            ChannelKey::History => {
                let Some(history) = parse_collection::<Band>(key, &row.value) else {
                    return false;
                };
                store.replace_history(history);
            }
        }

        self.last_fingerprint.insert(key, fingerprint);
        true
    }

    // ローカル変更の送信。指紋が変わったキーだけ書く
    pub async fn flush<TStore: IRowStore>(&mut self, store: &mut StateStore, client: &TStore) {
        if self.bootstrapping || !self.synchronized {
            return;
        }

        for key in store.take_dirty() {
            let value = match serialize_collection(store, key) {
                Ok(value) => value,
                Err(error) => {
                    log::warn!("failed to serialize {key}: {error}");
                    continue;
                }
            };

            let fingerprint = fingerprint_of(&value);
            if self.last_fingerprint.get(&key) == Some(&fingerprint) {
                continue;
            }

            match client.upsert_row(Row::new(key, value)).await {
                Ok(()) => {
                    self.last_fingerprint.insert(key, fingerprint);
                }
                Err(error) => {
                    // 指紋は更新しない。次の flush が自然に再送になる
                    log::warn!("failed to push {key}: {error}");
                    store.mark_dirty(key);
                }
            }
        }
    }
}

fn parse_collection<T: serde::de::DeserializeOwned>(
    key: ChannelKey,
    value: &serde_json::Value,
) -> Option<Vec<T>> {
    match serde_json::from_value(value.clone()) {
        Ok(collection) => Some(collection),
        Err(error) => {
            log::warn!("malformed payload for {key}, ignoring: {error}");
            None
        }
    }
}

fn serialize_collection(
    store: &StateStore,
    key: ChannelKey,
) -> Result<serde_json::Value, serde_json::Error> {
    match key {
        ChannelKey::Users => serde_json::to_value(store.users()),
        ChannelKey::Bands => serde_json::to_value(store.bands()),
        ChannelKey::History => serde_json::to_value(store.history()),
    }
}

#[cfg(test)]
mod tests {
    use super::{fingerprint_of, IRowStore, Row, SyncEngine, SyncError};
    use crate::mock::MemoryRowStore;
    use crate::store::{ChannelKey, StateStore};
    use crate::{Band, Instrument, User, UserId, UserStatus};

    fn demo_user(stage_name: &str) -> User {
        User {
            id: UserId::new(),
            first_name: stage_name.to_string(),
            last_name: "Demo".to_string(),
            stage_name: stage_name.to_string(),
            instruments: vec![Instrument::Guitar],
            custom_instrument: None,
            status: UserStatus::Active,
            avatar_seed: None,
            email: None,
            phone_number: None,
            instagram: None,
            created_at: 0,
        }
    }

    struct UnreachableStore;

    impl IRowStore for UnreachableStore {
        async fn fetch_row(&self, _key: ChannelKey) -> Result<Option<Row>, SyncError> {
            Err(SyncError::Unavailable("connection refused".to_string()))
        }

        async fn upsert_row(&self, _row: Row) -> Result<(), SyncError> {
            Err(SyncError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn bootstrap_empty_store_seeds_roster_without_pushing() {
        let remote = MemoryRowStore::new();
        let mut store = StateStore::new();
        let mut engine = SyncEngine::new(vec![demo_user("a"), demo_user("b")]);

        engine.bootstrap(&mut store, &remote).await;

        assert!(engine.is_synchronized());
        assert_eq!(store.users().len(), 2);
        // シードは本物のローカル変更が起きるまで上流に現れない
        engine.flush(&mut store, &remote).await;
        assert!(remote.row("users").is_none());
    }

    #[tokio::test]
    async fn bootstrap_failure_enters_degraded_mode() {
        let mut store = StateStore::new();
        let mut engine = SyncEngine::new(vec![demo_user("a")]);

        engine.bootstrap(&mut store, &UnreachableStore).await;

        assert!(!engine.is_bootstrapping());
        assert!(!engine.is_synchronized());
        assert_eq!(store.users().len(), 1);
    }

    #[tokio::test]
    async fn absorb_discards_echo_by_fingerprint() {
        let remote = MemoryRowStore::new();
        let mut store = StateStore::new();
        let mut engine = SyncEngine::new(Vec::new());
        engine.bootstrap(&mut store, &remote).await;

        store.with_bands(|bands| bands.push(Band::new("band_x", false)));
        engine.flush(&mut store, &remote).await;

        // 自分が書いた値のエコーは採用されない
        let echo = Row::new(ChannelKey::Bands, remote.row("bands").unwrap());
        assert!(!engine.absorb(&mut store, &echo));
    }

    #[tokio::test]
    async fn absorb_adopts_foreign_change() {
        let mut store = StateStore::new();
        let mut engine = SyncEngine::new(Vec::new());
        engine.bootstrap(&mut store, &MemoryRowStore::new()).await;

        let incoming = vec![Band::new("band_y", true)];
        let row = Row::new(ChannelKey::Bands, serde_json::to_value(&incoming).unwrap());

        assert!(engine.absorb(&mut store, &row));
        assert_eq!(store.bands().len(), 1);
        // 採用しただけでは dirty にならず、送り返されない
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn malformed_payload_is_noop() {
        let mut store = StateStore::new();
        let mut engine = SyncEngine::new(Vec::new());
        engine.bootstrap(&mut store, &MemoryRowStore::new()).await;

        let row = Row {
            key: "bands".to_string(),
            value: serde_json::json!({ "not": "an array" }),
        };

        assert!(!engine.absorb(&mut store, &row));
        assert!(store.bands().is_empty());
    }

    #[tokio::test]
    async fn flush_skips_unchanged_collections() {
        let remote = MemoryRowStore::new();
        let mut store = StateStore::new();
        let mut engine = SyncEngine::new(Vec::new());
        engine.bootstrap(&mut store, &remote).await;

        // 変更なしの with_bands でも dirty にはなるが、指紋が同じなので書かれない
        store.with_bands(|bands| bands.push(Band::new("band_x", false)));
        engine.flush(&mut store, &remote).await;
        let first = remote.row("bands").unwrap();

        store.with_bands(|_| {});
        engine.flush(&mut store, &remote).await;
        assert_eq!(remote.row("bands").unwrap(), first);
        assert_eq!(remote.upsert_count(), 1);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = serde_json::json!([{ "name": "x" }]);
        let b = serde_json::json!([{ "name": "x" }]);
        let c = serde_json::json!([{ "name": "y" }]);

        assert_eq!(fingerprint_of(&a), fingerprint_of(&b));
        assert_ne!(fingerprint_of(&a), fingerprint_of(&c));
    }
}
