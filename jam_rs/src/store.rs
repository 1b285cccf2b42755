use std::collections::BTreeSet;

use crate::{Band, User};

// 共有行ストア上の論理チャンネル名
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelKey {
    Users,
    Bands,
    History,
}

impl ChannelKey {
    pub const ALL: [ChannelKey; 3] = [ChannelKey::Users, ChannelKey::Bands, ChannelKey::History];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKey::Users => "users",
            ChannelKey::Bands => "bands",
            ChannelKey::History => "history",
        }
    }

    pub fn parse(key: &str) -> Option<ChannelKey> {
        match key {
            "users" => Some(ChannelKey::Users),
            "bands" => Some(ChannelKey::Bands),
            "history" => Some(ChannelKey::History),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// プロセス内の唯一の状態置き場
// ミューテーションは必ず with_* を通る。通った分だけ dirty に記録され、
// SyncEngine の送信パスが take_dirty() で回収する
#[derive(Debug, Default)]
pub struct StateStore {
    users: Vec<User>,

    // 先頭 (インデックス 0) がオンステージのバンド
    bands: Vec<Band>,

    // アーカイブ済みバンド。追記のみ
    history: Vec<Band>,

    dirty: BTreeSet<ChannelKey>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn history(&self) -> &[Band] {
        &self.history
    }

    // オンステージのバンド。空のキューは正常な待機状態
    pub fn head(&self) -> Option<&Band> {
        self.bands.first()
    }

    pub fn with_users<R>(&mut self, f: impl FnOnce(&mut Vec<User>) -> R) -> R {
        let result = f(&mut self.users);
        self.dirty.insert(ChannelKey::Users);
        result
    }

    pub fn with_bands<R>(&mut self, f: impl FnOnce(&mut Vec<Band>) -> R) -> R {
        let result = f(&mut self.bands);
        self.dirty.insert(ChannelKey::Bands);
        result
    }

    pub fn with_history<R>(&mut self, f: impl FnOnce(&mut Vec<Band>) -> R) -> R {
        let result = f(&mut self.history);
        self.dirty.insert(ChannelKey::History);
        result
    }

    pub fn take_dirty(&mut self) -> Vec<ChannelKey> {
        let keys: Vec<ChannelKey> = self.dirty.iter().copied().collect();
        self.dirty.clear();
        keys
    }

    pub fn mark_dirty(&mut self, key: ChannelKey) {
        self.dirty.insert(key);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    // リモート値の採用用。dirty を立てない (採用をそのまま送り返さないため)
    pub(crate) fn replace_users(&mut self, users: Vec<User>) {
        self.users = users;
    }

    pub(crate) fn replace_bands(&mut self, bands: Vec<Band>) {
        self.bands = bands;
    }

    pub(crate) fn replace_history(&mut self, history: Vec<Band>) {
        self.history = history;
    }
}
