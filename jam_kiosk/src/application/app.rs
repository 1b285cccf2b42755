use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use jam_players::demo::demo_users;
use jam_rs::live::LiveSession;
use jam_rs::overlay::{builtin_games, Game};
use jam_rs::store::StateStore;
use jam_rs::sync::{IPushChannel, IRowStore, SyncEngine};
use jam_rs::Instrument;

use super::command::{self, Command};
use super::render;
use super::timers::{TimerDriver, TimerId};
use super::Modal;

// ステージ表示プロセス
// 操作行・1 秒ティック・変更通知を 1 本のループに直列化する
pub struct App {
    session: LiveSession,
    engine: SyncEngine,
    driver: TimerDriver,
    modal: Modal,
    games: Vec<Game>,
}

impl App {
    pub async fn run<TStore, TChannel>(client: TStore, mut channel: TChannel)
    where
        TStore: IRowStore,
        TChannel: IPushChannel,
    {
        let (tick_tx, mut tick_rx) = mpsc::channel(8);

        let mut store = StateStore::new();
        let mut engine = SyncEngine::new(demo_users());
        engine.bootstrap(&mut store, &client).await;
        if !engine.is_synchronized() {
            log::warn!("store unreachable, display continues detached");
        }

        let mut app = App {
            session: LiveSession::new(store),
            engine,
            driver: TimerDriver::new(tick_tx),
            modal: Modal::None,
            games: builtin_games(),
        };

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        let mut channel_open = true;

        app.render();

        loop {
            tokio::select! {
                tick = tick_rx.recv() => {
                    let Some(id) = tick else { break };
                    app.handle_tick(id);
                }
                row = channel.next_change(), if channel_open => {
                    match row {
                        Some(row) => {
                            app.session.absorb(&mut app.engine, &row);
                        }
                        None => {
                            log::warn!("push channel closed, display continues detached");
                            channel_open = false;
                        }
                    }
                }
                line = lines.next_line() => {
                    let Ok(Some(line)) = line else { break };
                    if !app.handle_line(&line) {
                        break;
                    }
                }
            }

            app.reconcile_timers();
            app.session.flush(&mut app.engine, &client).await;
            app.render();
        }

        // 終了時の解除は無条件
        app.driver.cancel_all();
        drop(channel);
    }

    fn handle_tick(&mut self, id: TimerId) {
        match id {
            TimerId::Main => {
                self.session.tick_main();
            }
            TimerId::Game => {
                self.session.tick_game();
            }
        }
    }

    fn handle_line(&mut self, line: &str) -> bool {
        match command::parse(line) {
            Some(command) => self.handle_command(command),
            None => {
                if !line.trim().is_empty() {
                    println!("unknown command: {line}");
                }
                true
            }
        }
    }

    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,

            Command::Start => {
                self.session.start_timer();
            }
            Command::Pause => {
                self.session.pause_timer();
            }
            Command::Reset => self.session.reset_timer(),
            Command::Dismiss => {
                self.session.dismiss_alarm();
            }
            Command::Adjust(delta) => self.session.adjust_timer(delta),
            Command::Set(input) => self.session.set_timer_absolute(&input),

            Command::Next => self.session.request_advance(),
            Command::Confirm => {
                self.session.confirm_advance();
                self.modal = Modal::None;
            }
            Command::Cancel => self.session.cancel_advance(),

            Command::Rename(name) => {
                self.session.rename_head(&name);
            }
            Command::Add => self.modal = Modal::AddPick,
            Command::Pick(stage_name) => self.pick_user(stage_name),
            Command::Role(role) => self.assign_role(&role),
            Command::Back => {
                if matches!(self.modal, Modal::AddRole { .. }) {
                    self.modal = Modal::AddPick;
                }
            }
            Command::Remove(stage_name) => self.remove_member(&stage_name),

            Command::Games => self.modal = Modal::Games,
            Command::Game(index) => {
                if let Some(game) = self.games.get(index) {
                    self.session.select_game(game.clone());
                    self.modal = Modal::None;
                }
            }
            Command::GameDuration(seconds) => {
                self.session.choose_game_duration(seconds);
            }
            Command::Play => {
                self.session.start_game();
            }
            Command::Fullscreen => {
                self.session.toggle_game_fullscreen();
            }
            Command::GamePause => {
                self.session.toggle_game_running();
            }
            Command::Extend => self.session.adjust_game(30),

            Command::Close => {
                if !self.session.overlay().is_off() {
                    self.session.close_game();
                }
                self.modal = Modal::None;
            }
        }

        true
    }

    fn pick_user(&mut self, stage_name: String) {
        if self.modal != Modal::AddPick {
            return;
        }

        let available = render::available_users(&self.session)
            .iter()
            .any(|user| user.stage_name == stage_name);
        if available {
            self.modal = Modal::AddRole { stage_name };
        } else {
            println!("@{stage_name} is not available");
        }
    }

    fn assign_role(&mut self, role: &str) {
        let Modal::AddRole { stage_name } = self.modal.clone() else {
            return;
        };
        let Some(role) = Instrument::parse(role) else {
            println!("unknown instrument: {role}");
            return;
        };

        let user = self
            .session
            .store()
            .users()
            .iter()
            .find(|user| user.stage_name == stage_name)
            .cloned();
        let Some(user) = user else {
            self.modal = Modal::AddPick;
            return;
        };

        match self.session.add_member(&user, role) {
            Ok(true) => self.modal = Modal::None,
            Ok(false) => self.modal = Modal::None,
            Err(error) => println!("{error}"),
        }
    }

    fn remove_member(&mut self, stage_name: &str) {
        let member_id = self.session.store().head().and_then(|band| {
            band.members
                .iter()
                .find(|member| member.user.stage_name == stage_name)
                .map(|member| member.user.id)
        });

        // ライブ中の離脱は確認なしで即時に反映する
        if let Some(member_id) = member_id {
            self.session.remove_member(member_id);
        } else {
            println!("@{stage_name} is not on stage");
        }
    }

    // 遷移のたびに張り直す。張ってよいのは各マシン 1 本だけ
    fn reconcile_timers(&mut self) {
        self.driver
            .arm_if_needed(TimerId::Main, self.session.timer().should_tick());
        self.driver
            .arm_if_needed(TimerId::Game, self.session.overlay().should_tick());
    }

    fn render(&self) {
        print!("\x1b[2J\x1b[H");
        println!("{}", render::frame(&self.session, &self.modal, &self.games));
    }
}
