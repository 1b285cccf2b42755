use crate::overlay::{Game, GameOverlayMachine};
use crate::queue::{BandQueueManager, QueueError};
use crate::store::StateStore;
use crate::sync::{IRowStore, Row, SyncEngine};
use crate::timer::LiveTimerMachine;
use crate::{BandId, Instrument, User, UserId, DEFAULT_DURATION_MINUTES};

// ステージ表示プロセスの中核
// StateStore と 2 つのタイマーマシンを束ね、先頭バンドの交代を監視する
pub struct LiveSession {
    store: StateStore,
    timer: LiveTimerMachine,
    overlay: GameOverlayMachine,

    // 直近に観測した先頭バンド。duration はビット表現で比較する
    head: Option<(BandId, u64)>,
}

fn head_key(store: &StateStore) -> Option<(BandId, u64)> {
    store
        .head()
        .map(|band| (band.id, band.duration_minutes.to_bits()))
}

impl LiveSession {
    pub fn new(store: StateStore) -> Self {
        let head = head_key(&store);
        let duration = store
            .head()
            .map(|band| band.duration_minutes)
            .unwrap_or(DEFAULT_DURATION_MINUTES);

        Self {
            store,
            timer: LiveTimerMachine::new(duration),
            overlay: GameOverlayMachine::new(),
            head,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn timer(&self) -> &LiveTimerMachine {
        &self.timer
    }

    pub fn overlay(&self) -> &GameOverlayMachine {
        &self.overlay
    }

    // すべてのミューテーションの漏斗
    // 適用後に先頭交代の副作用をまとめて処理する
    pub fn apply<R>(&mut self, f: impl FnOnce(&mut StateStore) -> R) -> R {
        let result = f(&mut self.store);
        self.sync_head();
        result
    }

    // リモート値の採用。先頭が変われば同じ副作用が走る
    pub fn absorb(&mut self, engine: &mut SyncEngine, row: &Row) -> bool {
        let adopted = engine.absorb(&mut self.store, row);
        if adopted {
            self.sync_head();
        }
        adopted
    }

    // ローカル変更の送信。状態は変えないがストアへの入り口をここに揃える
    pub async fn flush<TStore: IRowStore>(&mut self, engine: &mut SyncEngine, client: &TStore) {
        engine.flush(&mut self.store, client).await;
    }

    // 先頭が変わっていたら無条件で RESET し、オーバーレイも OFF に戻す
    // ローカルの advance でもリモート採用でも同じ経路を通る
    fn sync_head(&mut self) {
        let current = head_key(&self.store);
        if current == self.head {
            return;
        }

        self.head = current;
        let duration = self
            .store
            .head()
            .map(|band| band.duration_minutes)
            .unwrap_or(0.0);
        self.timer.reset(duration);
        self.overlay.close();
    }

    // ---- メインタイマー操作 ----

    pub fn start_timer(&mut self) -> bool {
        self.timer.start()
    }

    pub fn pause_timer(&mut self) -> bool {
        self.timer.pause()
    }

    pub fn adjust_timer(&mut self, delta_seconds: i64) {
        self.timer.adjust(delta_seconds);
    }

    pub fn set_timer_absolute(&mut self, input: &str) {
        self.timer.set_absolute(input);
    }

    pub fn reset_timer(&mut self) {
        let duration = self
            .store
            .head()
            .map(|band| band.duration_minutes)
            .unwrap_or(0.0);
        self.timer.reset(duration);
    }

    pub fn dismiss_alarm(&mut self) -> bool {
        self.timer.dismiss()
    }

    pub fn tick_main(&mut self) -> bool {
        self.timer.tick()
    }

    // ---- 次のバンドへ (二段階確認) ----

    pub fn request_advance(&mut self) {
        self.timer.request_advance();
    }

    pub fn cancel_advance(&mut self) {
        self.timer.cancel_advance();
    }

    // 確認済みのときだけ先頭をアーカイブする
    pub fn confirm_advance(&mut self) -> Option<BandId> {
        if !self.timer.take_confirmation() {
            return None;
        }

        let archived = BandQueueManager::new(&mut self.store).archive_head();
        self.sync_head();
        archived
    }

    // ---- 先頭バンドのライブ編集 ----

    pub fn rename_head(&mut self, new_name: &str) -> bool {
        let Some(id) = self.store.head().map(|band| band.id) else {
            return false;
        };

        self.apply(|store| BandQueueManager::new(store).rename(id, new_name))
    }

    pub fn add_member(&mut self, user: &User, role: Instrument) -> Result<bool, QueueError> {
        self.apply(|store| BandQueueManager::new(store).add_member_to_head(user, role))
    }

    pub fn remove_member(&mut self, user_id: UserId) -> bool {
        self.apply(|store| BandQueueManager::new(store).remove_member_from_head(user_id))
    }

    // ---- ゲームオーバーレイ ----

    pub fn select_game(&mut self, game: Game) {
        self.overlay.select(game);
    }

    // 唯一の機械間連動: ゲーム開始時、メインタイマーが止まっていれば一緒に走らせる
    pub fn start_game(&mut self) -> bool {
        if !self.overlay.start() {
            return false;
        }

        self.timer.start();
        true
    }

    pub fn close_game(&mut self) {
        self.overlay.close();
    }

    pub fn choose_game_duration(&mut self, seconds: u64) -> bool {
        self.overlay.choose_duration(seconds)
    }

    pub fn adjust_game(&mut self, delta_seconds: i64) {
        self.overlay.adjust(delta_seconds);
    }

    pub fn toggle_game_fullscreen(&mut self) -> bool {
        self.overlay.toggle_fullscreen()
    }

    pub fn toggle_game_running(&mut self) -> bool {
        self.overlay.toggle_running()
    }

    pub fn tick_game(&mut self) -> bool {
        self.overlay.tick()
    }
}

#[cfg(test)]
mod tests {
    use super::LiveSession;
    use crate::overlay::builtin_games;
    use crate::store::StateStore;
    use crate::timer::TimerState;
    use crate::{Band, Instrument, User, UserId, UserStatus};

    fn store_with_queue(durations: &[(&str, f64)]) -> StateStore {
        let mut store = StateStore::new();
        store.with_bands(|bands| {
            for (name, duration) in durations {
                let mut band = Band::new(*name, false);
                band.duration_minutes = *duration;
                bands.push(band);
            }
        });
        store.take_dirty();
        store
    }

    fn player(stage_name: &str, instruments: Vec<Instrument>) -> User {
        User {
            id: UserId::new(),
            first_name: stage_name.to_string(),
            last_name: "Player".to_string(),
            stage_name: stage_name.to_string(),
            instruments,
            custom_instrument: None,
            status: UserStatus::Active,
            avatar_seed: None,
            email: None,
            phone_number: None,
            instagram: None,
            created_at: 0,
        }
    }

    #[test]
    fn new_session_loads_head_duration() {
        let session = LiveSession::new(store_with_queue(&[("band_x", 5.0)]));
        assert_eq!(session.timer().remaining(), 300);
        assert_eq!(session.timer().state(), TimerState::Ready);
    }

    #[test]
    fn confirmed_advance_archives_head_and_resets() {
        let mut session = LiveSession::new(store_with_queue(&[("band_a", 6.0), ("band_b", 3.0)]));
        session.start_timer();
        session.select_game(builtin_games().remove(0));
        session.start_game();

        // 確認なしでは何も起きない
        assert!(session.confirm_advance().is_none());

        session.request_advance();
        let archived = session.confirm_advance().unwrap();

        assert_eq!(session.store().history().len(), 1);
        assert_eq!(session.store().history()[0].id, archived);
        assert!(session.store().history()[0].end_time.is_some());

        // 新しい先頭に合わせて RESET、オーバーレイは OFF
        assert_eq!(session.store().head().unwrap().name, "band_b");
        assert_eq!(session.timer().remaining(), 180);
        assert_eq!(session.timer().state(), TimerState::Paused);
        assert!(session.overlay().is_off());
    }

    #[test]
    fn advancing_last_band_leaves_waiting_state() {
        let mut session = LiveSession::new(store_with_queue(&[("band_a", 6.0)]));
        session.request_advance();
        session.confirm_advance();

        // 空のキューは待機状態であってエラーではない
        assert!(session.store().head().is_none());
        assert!(session.store().bands().is_empty());
        assert_eq!(session.store().history().len(), 1);
        assert_eq!(session.timer().remaining(), 0);
    }

    #[test]
    fn remote_adoption_triggers_head_reset() {
        let mut session = LiveSession::new(store_with_queue(&[("band_a", 6.0), ("band_b", 4.0)]));
        session.start_timer();

        // リモート採用と同じ経路: dirty を立てない差し替えでも先頭交代を検知する
        session.apply(|store| {
            let mut bands = store.bands().to_vec();
            bands.remove(0);
            store.replace_bands(bands);
        });

        assert_eq!(session.timer().remaining(), 240);
        assert_eq!(session.timer().state(), TimerState::Paused);
    }

    #[test]
    fn head_duration_edit_reloads_timer() {
        let mut session = LiveSession::new(store_with_queue(&[("band_a", 6.0)]));
        let id = session.store().head().unwrap().id;

        session.apply(|store| {
            crate::queue::BandQueueManager::new(store).set_duration(id, 2.0)
        });

        assert_eq!(session.timer().remaining(), 120);
    }

    #[test]
    fn rename_does_not_reset_timer() {
        let mut session = LiveSession::new(store_with_queue(&[("band_a", 6.0)]));
        session.start_timer();
        session.tick_main();

        assert!(session.rename_head("band_a2"));
        assert_eq!(session.store().head().unwrap().name, "band_a2");
        assert!(session.timer().is_running());
        assert_eq!(session.timer().remaining(), 359);
    }

    #[test]
    fn game_start_couples_paused_timer() {
        let mut session = LiveSession::new(store_with_queue(&[("band_a", 2.0)]));
        session.start_timer();
        session.pause_timer();
        assert_eq!(session.timer().remaining(), 120);
        assert_eq!(session.timer().state(), TimerState::Paused);

        session.select_game(builtin_games().remove(0));
        assert!(session.start_game());

        assert!(session.timer().is_running());
    }

    #[test]
    fn game_start_leaves_expired_timer_alone() {
        let mut session = LiveSession::new(store_with_queue(&[("band_a", 6.0)]));
        session.set_timer_absolute("0:01");
        session.start_timer();
        session.tick_main();
        assert!(session.timer().is_expired());

        session.select_game(builtin_games().remove(0));
        session.start_game();

        // 残り 0 の EXPIRED は連動の対象外
        assert!(session.timer().is_expired());
    }

    #[test]
    fn live_member_edits_stay_on_head() {
        let mut session = LiveSession::new(store_with_queue(&[("band_a", 6.0)]));
        let guitarist = player("rei", vec![Instrument::Guitar]);
        let id = guitarist.id;

        assert!(session.add_member(&guitarist, Instrument::Guitar).unwrap());
        assert!(!session.add_member(&guitarist, Instrument::Guitar).unwrap());
        assert!(session.remove_member(id));

        assert!(session.store().head().unwrap().members.is_empty());
    }
}
