use chrono::Utc;
use thiserror::Error;

use crate::store::StateStore;
use crate::{Band, BandId, BandMember, Instrument, User, UserId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    // ロールは本人の申告楽器から選ぶ。検証はスナップショット作成時の一度だけ
    #[error("{stage_name} does not play {}", .role.label())]
    RoleNotDeclared {
        stage_name: String,
        role: Instrument,
    },
}

// ロール検証つきでメンバースナップショットを作る
pub fn snapshot_member(user: &User, role: Instrument) -> Result<BandMember, QueueError> {
    if !user.plays(role) {
        return Err(QueueError::RoleNotDeclared {
            stage_name: user.stage_name.clone(),
            role,
        });
    }

    Ok(BandMember {
        user: user.clone(),
        assigned_role: role,
    })
}

// ActiveQueue / History へのミューテーション API
// ライブ表示面はメンバー操作が先頭バンド限定、管理面は任意位置を触れる。
// この非対称は API の契約であって偶然ではない
pub struct BandQueueManager<'a> {
    store: &'a mut StateStore,
}

impl<'a> BandQueueManager<'a> {
    pub fn new(store: &'a mut StateStore) -> Self {
        Self { store }
    }

    pub fn append(&mut self, band: Band) {
        self.store.with_bands(|bands| bands.push(band));
    }

    // 先頭バンドを end_time を刻印して History へ移す
    // 空のキューでは何もしない
    pub fn archive_head(&mut self) -> Option<BandId> {
        if self.store.head().is_none() {
            return None;
        }

        let mut archived = self.store.with_bands(|bands| bands.remove(0));
        let archived_id = archived.id;
        archived.end_time = Some(Utc::now().to_rfc3339());
        self.store.with_history(|history| history.push(archived));

        Some(archived_id)
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from == to {
            return false;
        }

        self.store.with_bands(|bands| {
            if from >= bands.len() || to >= bands.len() {
                return false;
            }

            let band = bands.remove(from);
            bands.insert(to, band);
            true
        })
    }

    // 確認は呼び出し側の責務。ここでは即削除する
    pub fn remove_at(&mut self, index: usize) -> Option<Band> {
        self.store.with_bands(|bands| {
            if index >= bands.len() {
                return None;
            }

            Some(bands.remove(index))
        })
    }

    pub fn rename(&mut self, id: BandId, new_name: &str) -> bool {
        self.store.with_bands(|bands| {
            let Some(band) = bands.iter_mut().find(|band| band.id == id) else {
                return false;
            };

            band.name = new_name.to_string();
            true
        })
    }

    pub fn set_duration(&mut self, id: BandId, minutes: f64) -> bool {
        self.store.with_bands(|bands| {
            let Some(band) = bands.iter_mut().find(|band| band.id == id) else {
                return false;
            };

            band.duration_minutes = minutes;
            true
        })
    }

    // すでにメンバーなら何もしない
    pub fn add_member_to_head(&mut self, user: &User, role: Instrument) -> Result<bool, QueueError> {
        let Some(head) = self.store.head() else {
            return Ok(false);
        };

        if head.has_member(user.id) {
            return Ok(false);
        }

        let member = snapshot_member(user, role)?;
        self.store.with_bands(|bands| bands[0].members.push(member));

        Ok(true)
    }

    // ライブ中の応答性のため、確認なしで即時に効く
    pub fn remove_member_from_head(&mut self, user_id: UserId) -> bool {
        let Some(head) = self.store.head() else {
            return false;
        };

        if !head.has_member(user_id) {
            return false;
        }

        self.store.with_bands(|bands| {
            bands[0].members.retain(|member| member.user.id != user_id);
        });

        true
    }

    // 管理面のバンドエディター用。編成を丸ごと差し替える
    pub fn set_members(
        &mut self,
        id: BandId,
        members: &[(User, Instrument)],
    ) -> Result<bool, QueueError> {
        let mut snapshots = Vec::with_capacity(members.len());
        for (user, role) in members {
            snapshots.push(snapshot_member(user, *role)?);
        }

        Ok(self.store.with_bands(|bands| {
            let Some(band) = bands.iter_mut().find(|band| band.id == id) else {
                return false;
            };

            band.members = snapshots;
            true
        }))
    }
}
