use jam_rs::live::LiveSession;
use jam_rs::overlay::{OverlayState, DURATION_CHOICES};
use jam_rs::timer::format_time;
use jam_rs::{Band, User};

use super::Modal;

const WIDTH: usize = 72;

fn rule() -> String {
    "=".repeat(WIDTH)
}

// 1 イベントごとに丸ごと描き直すテキストフレーム
pub fn frame(session: &LiveSession, modal: &Modal, games: &[jam_rs::overlay::Game]) -> String {
    // 待機画面が最優先。空のキューはエラーではない
    let Some(head) = session.store().head() else {
        return waiting_frame();
    };

    if !session.overlay().is_off() {
        return game_frame(session);
    }

    if session.timer().is_expired() {
        return expired_frame();
    }

    if session.timer().is_urgent() && *modal == Modal::None {
        return urgent_frame(session);
    }

    normal_frame(session, head, modal, games)
}

fn waiting_frame() -> String {
    let mut out = String::new();
    out.push_str(&rule());
    out.push_str("\n\n        WAITING FOR BANDS...\n\n");
    out.push_str("        queue is empty, add bands from the admin console\n\n");
    out.push_str(&rule());
    out.push('\n');
    out
}

fn expired_frame() -> String {
    let mut out = String::new();
    out.push_str(&rule());
    out.push_str("\n\n        ##  TIME!  ##\n\n");
    out.push_str("        [dismiss] to stop the alarm\n\n");
    out.push_str(&rule());
    out.push('\n');
    out
}

fn urgent_frame(session: &LiveSession) -> String {
    let mut out = String::new();
    out.push_str(&rule());
    out.push_str(&format!(
        "\n\n        {:>2} SECONDS - WRAP IT UP!\n\n",
        session.timer().remaining()
    ));
    out.push_str("        [+30] [-30] to adjust\n\n");
    out.push_str(&rule());
    out.push('\n');
    out
}

fn game_frame(session: &LiveSession) -> String {
    let overlay = session.overlay();
    let Some(game) = overlay.game() else {
        return String::new();
    };

    let mut out = String::new();
    out.push_str(&rule());

    match overlay.state() {
        OverlayState::Explain => {
            out.push_str(&format!("\n  GAME: {}\n\n  {}\n\n", game.title, game.description));
            let choices: Vec<String> = DURATION_CHOICES
                .iter()
                .map(|seconds| {
                    if *seconds == overlay.duration_choice() {
                        format!("[{seconds}]")
                    } else {
                        format!(" {seconds} ")
                    }
                })
                .collect();
            out.push_str(&format!("  duration: {}\n", choices.join(" ")));
            out.push_str("  [dur N] choose, [play] start, [close] leave\n");
        }
        OverlayState::Playing { fullscreen } => {
            if fullscreen {
                out.push_str(&format!("\n  {}\n\n", game.title));
                if overlay.is_expired() {
                    out.push_str("        ##  STOP!  ##\n");
                } else {
                    out.push_str(&format!(
                        "        {}\n",
                        format_time(overlay.remaining())
                    ));
                }
                out.push_str("\n  [fs] shrink, [extend] +30s, [close] end game\n");
            } else {
                out.push_str(&format!("\n  GAME: {}\n\n  {}\n\n", game.title, game.description));
                if overlay.is_expired() {
                    out.push_str("  ##  STOP!  ##\n");
                } else {
                    out.push_str(&format!(
                        "  remaining: {}\n",
                        format_time(overlay.remaining())
                    ));
                }
                out.push_str("  [gpause] pause, [fs] fullscreen, [extend] +30s, [close] end\n");
            }
        }
        OverlayState::Off => {}
    }

    // ゲーム中でもジャムの残り時間は常に見せる
    out.push_str(&format!(
        "\n  jam timer: {} {}\n",
        format_time(session.timer().remaining()),
        if session.timer().is_running() {
            "(running)"
        } else {
            "(paused)"
        }
    ));
    out.push_str(&rule());
    out.push('\n');
    out
}

fn normal_frame(
    session: &LiveSession,
    head: &Band,
    modal: &Modal,
    games: &[jam_rs::overlay::Game],
) -> String {
    let mut out = String::new();
    out.push_str(&rule());
    out.push_str(&format!("\n  ON STAGE: {}\n", head.name));
    for member in &head.members {
        out.push_str(&format!(
            "    - {:<24} {}\n",
            member.user.full_name(),
            member.role_label()
        ));
    }
    if head.members.is_empty() {
        out.push_str("    (no members yet)\n");
    }

    let timer = session.timer();
    out.push_str(&format!(
        "\n  {}  {}\n",
        format_time(timer.remaining()),
        if timer.is_running() {
            "(running)"
        } else {
            "(paused)"
        }
    ));

    if timer.is_confirming() {
        out.push_str("\n  advance to the next band? [confirm] / [cancel]\n");
    }

    match modal {
        Modal::None => {}
        Modal::Games => {
            out.push_str("\n  -- games --\n");
            for (index, game) in games.iter().enumerate() {
                out.push_str(&format!("    [game {index}] {}\n", game.title));
            }
            out.push_str("    [close] to dismiss\n");
        }
        Modal::AddPick => {
            out.push_str("\n  -- add musician --\n");
            let available = available_users(session);
            if available.is_empty() {
                out.push_str("    everyone is already on stage\n");
            }
            for user in available {
                let roles: Vec<&str> = user
                    .instruments
                    .iter()
                    .map(|instrument| instrument.label())
                    .collect();
                out.push_str(&format!(
                    "    [pick {}] {} ({})\n",
                    user.stage_name,
                    user.full_name(),
                    roles.join(", ")
                ));
            }
            out.push_str("    [close] to dismiss\n");
        }
        Modal::AddRole { stage_name } => {
            out.push_str(&format!("\n  -- what does @{stage_name} play? --\n"));
            if let Some(user) = session
                .store()
                .users()
                .iter()
                .find(|user| &user.stage_name == stage_name)
            {
                for instrument in &user.instruments {
                    out.push_str(&format!("    [role {}]\n", instrument.label()));
                }
            }
            out.push_str("    [back] to choose someone else\n");
        }
    }

    if let Some(next) = session.store().bands().get(1) {
        out.push_str(&format!("\n  next up: {}\n", next.name));
        for member in &next.members {
            out.push_str(&format!(
                "    - {} ({})\n",
                member.user.full_name(),
                member.role_label()
            ));
        }
    } else {
        out.push_str("\n  next up: nothing else in the queue\n");
    }

    out.push_str(&rule());
    out.push('\n');
    out
}

// ライブで追加できるのは ACTIVE かつ未出演のユーザーだけ
pub fn available_users(session: &LiveSession) -> Vec<&User> {
    let Some(head) = session.store().head() else {
        return Vec::new();
    };

    session
        .store()
        .users()
        .iter()
        .filter(|user| user.is_active() && !head.has_member(user.id))
        .collect()
}
