// メインのステージカウントダウン
// リアクティブな再計算ではなく、列挙した遷移だけで状態が動く

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    // 停止中で満タンの残り時間が読み込まれた状態
    Ready,
    Running,
    Paused,
    Expired,
}

#[derive(Debug)]
pub struct LiveTimerMachine {
    state: TimerState,
    // 残り秒数
    remaining: u64,
    // 直近の RESET で読み込んだ満タン秒数
    full: u64,
    // 「次のバンドへ」の二段階確認中かどうか
    confirming: bool,
}

impl LiveTimerMachine {
    pub fn new(duration_minutes: f64) -> Self {
        let full = duration_to_seconds(duration_minutes);
        Self {
            state: TimerState::Ready,
            remaining: full,
            full,
            confirming: false,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn full(&self) -> u64 {
        self.full
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming
    }

    // 警告表示は派生状態であって保存しない
    // モーダルやオーバーレイの有無は表示側が重ねて判定する
    pub fn is_urgent(&self) -> bool {
        self.state != TimerState::Expired && 0 < self.remaining && self.remaining <= 30
    }

    // ティックコールバックを張るべきかどうか
    pub fn should_tick(&self) -> bool {
        self.state == TimerState::Running && self.remaining > 0
    }

    // READY/PAUSED からのみ。残りが 0 なら開始しない
    pub fn start(&mut self) -> bool {
        match self.state {
            TimerState::Ready | TimerState::Paused if self.remaining > 0 => {
                self.state = TimerState::Running;
                true
            }
            _ => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }

        self.state = TimerState::Paused;
        true
    }

    // 1 秒ごとに呼ばれる。戻り値はティックループを張り続けるかどうか
    pub fn tick(&mut self) -> bool {
        if !self.should_tick() {
            return false;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            self.state = TimerState::Expired;
            return false;
        }

        true
    }

    // どの状態からでも可。EXPIRED は delta の符号に関係なく無条件で解除して PAUSED へ
    pub fn adjust(&mut self, delta_seconds: i64) {
        self.remaining = (self.remaining as i64 + delta_seconds).max(0) as u64;
        if self.state == TimerState::Expired {
            self.state = TimerState::Paused;
        }
    }

    // 入力値をそのまま残り時間にする。実行中フラグは触らない
    pub fn set_absolute(&mut self, input: &str) {
        self.remaining = parse_timer_input(input);
    }

    pub fn reset(&mut self, duration_minutes: f64) {
        self.full = duration_to_seconds(duration_minutes);
        self.remaining = self.full;
        self.state = TimerState::Paused;
        self.confirming = false;
    }

    // EXPIRED からのみ。残り 0 のまま PAUSED に戻す
    pub fn dismiss(&mut self) -> bool {
        if self.state != TimerState::Expired {
            return false;
        }

        self.state = TimerState::Paused;
        true
    }

    pub fn request_advance(&mut self) {
        self.confirming = true;
    }

    pub fn cancel_advance(&mut self) {
        self.confirming = false;
    }

    // 確認済みなら確認状態を落として true を返す。アーカイブ自体は呼び出し側
    pub fn take_confirmation(&mut self) -> bool {
        if !self.confirming {
            return false;
        }

        self.confirming = false;
        true
    }
}

pub fn duration_to_seconds(duration_minutes: f64) -> u64 {
    (duration_minutes * 60.0).floor().max(0.0) as u64
}

// "5" → 5 分、"6.5" → 6 分半、"5:30" → 5 分 30 秒
// 壊れた入力は 0 扱い
pub fn parse_timer_input(input: &str) -> u64 {
    let input = input.trim();
    if let Some((minutes, seconds)) = input.split_once(':') {
        let minutes: u64 = minutes.trim().parse().unwrap_or(0);
        let seconds: u64 = seconds.trim().parse().unwrap_or(0);
        return minutes * 60 + seconds;
    }

    let minutes: f64 = input.parse().unwrap_or(0.0);
    duration_to_seconds(minutes)
}

pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
