use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// マシンごとのワンショットの 1 秒ティック
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    Main,
    Game,
}

// 各マシンに同時に 1 本しかティックを張らないための置き場
// 張り替え前と破棄時には必ずキャンセルする。二重ティックは欠陥
pub struct TimerDriver {
    timers: HashMap<TimerId, JoinHandle<()>>,
    tick_tx: mpsc::Sender<TimerId>,
}

impl TimerDriver {
    pub fn new(tick_tx: mpsc::Sender<TimerId>) -> Self {
        Self {
            timers: HashMap::new(),
            tick_tx,
        }
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers
            .get(&id)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn arm(&mut self, id: TimerId) {
        self.cancel(id);

        let tick_tx = self.tick_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = tick_tx.send(id).await;
        });
        self.timers.insert(id, handle);
    }

    pub fn arm_if_needed(&mut self, id: TimerId, should_tick: bool) {
        if should_tick {
            if !self.is_armed(id) {
                self.arm(id);
            }
        } else {
            self.cancel(id);
        }
    }

    pub fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.timers.remove(&id) {
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::{TimerDriver, TimerId};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn arm_fires_once() {
        tokio::time::pause();
        let (tx, mut rx) = mpsc::channel(4);
        let mut driver = TimerDriver::new(tx);

        driver.arm(TimerId::Main);
        assert!(driver.is_armed(TimerId::Main));

        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, Some(TimerId::Main));

        // ワンショットなので 2 発目は来ない
        tokio::time::advance(std::time::Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn rearm_replaces_pending_tick() {
        tokio::time::pause();
        let (tx, mut rx) = mpsc::channel(4);
        let mut driver = TimerDriver::new(tx);

        driver.arm(TimerId::Game);
        driver.arm(TimerId::Game);

        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, Some(TimerId::Game));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn cancel_prevents_tick() {
        tokio::time::pause();
        let (tx, mut rx) = mpsc::channel(4);
        let mut driver = TimerDriver::new(tx);

        driver.arm(TimerId::Main);
        driver.cancel(TimerId::Main);
        assert!(!driver.is_armed(TimerId::Main));

        tokio::time::advance(std::time::Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn arm_if_needed_follows_condition() {
        let (tx, _rx) = mpsc::channel(4);
        let mut driver = TimerDriver::new(tx);

        driver.arm_if_needed(TimerId::Main, true);
        assert!(driver.is_armed(TimerId::Main));

        driver.arm_if_needed(TimerId::Main, false);
        assert!(!driver.is_armed(TimerId::Main));
    }
}
