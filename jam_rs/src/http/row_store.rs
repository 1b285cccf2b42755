use std::collections::VecDeque;

use crate::store::ChannelKey;
use crate::sync::{IPushChannel, IRowStore, Row, SyncError};

use super::rest_type::{ChangesType, RowType};

// 共有行ストアの REST クライアント
//   GET {base}/rows/{key}        行の取得 (404 は未作成)
//   PUT {base}/rows/{key}        行の丸ごと上書き
//   GET {base}/changes?cursor=N  変更通知のロングポーリング
pub struct RowStoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl RowStoreClient {
    pub fn new<T: AsRef<str>>(base_url: T) -> Self {
        Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn changes(&self) -> ChangeStream {
        ChangeStream {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            cursor: 0,
            pending: VecDeque::new(),
        }
    }
}

impl IRowStore for RowStoreClient {
    async fn fetch_row(&self, key: ChannelKey) -> Result<Option<Row>, SyncError> {
        let url = format!("{}/rows/{}", self.base_url, key.as_str());
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let row: RowType = response.error_for_status()?.json().await?;
        Ok(Some(Row {
            key: row.key,
            value: row.value,
        }))
    }

    async fn upsert_row(&self, row: Row) -> Result<(), SyncError> {
        let url = format!("{}/rows/{}", self.base_url, row.key);
        let body = RowType {
            key: row.key,
            value: row.value,
        };

        self.client
            .put(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

// 変更通知のロングポーリング
// 再接続ポリシーは持たない。失敗したらチャンネル終了として縮退させる
pub struct ChangeStream {
    base_url: String,
    client: reqwest::Client,
    cursor: u64,
    pending: VecDeque<RowType>,
}

impl IPushChannel for ChangeStream {
    async fn next_change(&mut self) -> Option<Row> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Row {
                    key: row.key,
                    value: row.value,
                });
            }

            let url = format!("{}/changes?cursor={}", self.base_url, self.cursor);
            let response = match self.client.get(&url).send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => response,
                    Err(error) => {
                        log::warn!("push channel closed: {error}");
                        return None;
                    }
                },
                Err(error) => {
                    log::warn!("push channel closed: {error}");
                    return None;
                }
            };

            let changes: ChangesType = match response.json().await {
                Ok(changes) => changes,
                Err(error) => {
                    log::warn!("push channel returned malformed body: {error}");
                    return None;
                }
            };

            self.cursor = changes.cursor;
            self.pending.extend(changes.rows);
        }
    }
}
