use serde::{Deserialize, Serialize};

// ライブ表示に重ねるミニゲームのオーバーレイ
// メインタイマーとは独立したカウントダウンを持つ

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub title: String,
    pub description: String,
}

pub fn builtin_games() -> Vec<Game> {
    vec![
        Game {
            id: "game-hand".to_string(),
            title: "ONE HAND ONLY".to_string(),
            description: "Everyone plays with a single hand, left or right. Pick one and keep it."
                .to_string(),
        },
        Game {
            id: "game-foot".to_string(),
            title: "ON ONE FOOT".to_string(),
            description:
                "Play while balancing on one leg. Touch the floor and you sit out for 5 seconds."
                    .to_string(),
        },
    ]
}

pub const DURATION_CHOICES: [u64; 4] = [30, 60, 120, 180];
pub const DEFAULT_GAME_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Off,
    // 説明と時間選択を表示
    Explain,
    Playing { fullscreen: bool },
}

#[derive(Debug)]
pub struct GameOverlayMachine {
    state: OverlayState,
    game: Option<Game>,
    duration_choice: u64,
    remaining: u64,
    running: bool,
    expired: bool,
}

impl GameOverlayMachine {
    pub fn new() -> Self {
        Self {
            state: OverlayState::Off,
            game: None,
            duration_choice: DEFAULT_GAME_SECONDS,
            remaining: 0,
            running: false,
            expired: false,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn duration_choice(&self) -> u64 {
        self.duration_choice
    }

    pub fn is_off(&self) -> bool {
        self.state == OverlayState::Off
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn should_tick(&self) -> bool {
        matches!(self.state, OverlayState::Playing { .. })
            && self.running
            && !self.expired
            && self.remaining > 0
    }

    // ゲーム選択。時間は既定値に戻り、前回の満了フラグも消える
    pub fn select(&mut self, game: Game) {
        self.game = Some(game);
        self.state = OverlayState::Explain;
        self.duration_choice = DEFAULT_GAME_SECONDS;
        self.expired = false;
        self.running = false;
        self.remaining = 0;
    }

    pub fn choose_duration(&mut self, seconds: u64) -> bool {
        if self.state != OverlayState::Explain || !DURATION_CHOICES.contains(&seconds) {
            return false;
        }

        self.duration_choice = seconds;
        true
    }

    // EXPLAIN からのみ。自前のカウントダウンを起動する
    pub fn start(&mut self) -> bool {
        if self.state != OverlayState::Explain {
            return false;
        }

        self.state = OverlayState::Playing { fullscreen: false };
        self.remaining = self.duration_choice;
        self.running = true;
        self.expired = false;
        true
    }

    // メインタイマーと同じ 1 秒刻み。満了後は閉じるか延長されるまでバナーを出し続ける
    pub fn tick(&mut self) -> bool {
        if !self.should_tick() {
            return false;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            self.running = false;
            self.expired = true;
            return false;
        }

        true
    }

    // +30 秒式の延長。満了中に残りが戻ったらカウントダウンを再開する
    pub fn adjust(&mut self, delta_seconds: i64) {
        if !matches!(self.state, OverlayState::Playing { .. }) {
            return;
        }

        self.remaining = (self.remaining as i64 + delta_seconds).max(0) as u64;
        if self.expired && self.remaining > 0 {
            self.expired = false;
            self.running = true;
        }
    }

    pub fn toggle_running(&mut self) -> bool {
        if !matches!(self.state, OverlayState::Playing { .. }) || self.expired {
            return false;
        }

        self.running = !self.running;
        true
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        let OverlayState::Playing { fullscreen } = self.state else {
            return false;
        };

        self.state = OverlayState::Playing {
            fullscreen: !fullscreen,
        };
        true
    }

    // どの状態からでも OFF に戻す
    pub fn close(&mut self) {
        self.state = OverlayState::Off;
        self.game = None;
        self.running = false;
        self.expired = false;
        self.remaining = 0;
    }
}

impl Default for GameOverlayMachine {
    fn default() -> Self {
        Self::new()
    }
}
