// 操作行のコマンド
// ステージ脇の端末から 1 行ずつ入力される

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // メインタイマー
    Start,
    Pause,
    Reset,
    Dismiss,
    Adjust(i64),
    Set(String),

    // 次のバンドへ (二段階確認)
    Next,
    Confirm,
    Cancel,

    // 先頭バンドのライブ編集
    Rename(String),
    Add,
    Pick(String),
    Role(String),
    Back,
    Remove(String),

    // ゲームオーバーレイ
    Games,
    Game(usize),
    GameDuration(u64),
    Play,
    Fullscreen,
    GamePause,
    Extend,

    // モーダル/オーバーレイを閉じる
    Close,

    Quit,
}

pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // "+30" / "-60" はそのまま秒数の増減
    if let Ok(delta) = line.parse::<i64>() {
        if line.starts_with('+') || line.starts_with('-') {
            return Some(Command::Adjust(delta));
        }
    }

    let (word, rest) = match line.split_once(' ') {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "start" => Some(Command::Start),
        "pause" => Some(Command::Pause),
        "reset" => Some(Command::Reset),
        "dismiss" => Some(Command::Dismiss),
        "set" if !rest.is_empty() => Some(Command::Set(rest.to_string())),
        "next" => Some(Command::Next),
        "confirm" => Some(Command::Confirm),
        "cancel" => Some(Command::Cancel),
        "rename" if !rest.is_empty() => Some(Command::Rename(rest.to_string())),
        "add" => Some(Command::Add),
        "pick" if !rest.is_empty() => Some(Command::Pick(rest.to_string())),
        "role" if !rest.is_empty() => Some(Command::Role(rest.to_string())),
        "back" => Some(Command::Back),
        "remove" if !rest.is_empty() => Some(Command::Remove(rest.to_string())),
        "games" => Some(Command::Games),
        "game" => rest.parse().ok().map(Command::Game),
        "dur" => rest.parse().ok().map(Command::GameDuration),
        "play" => Some(Command::Play),
        "fs" => Some(Command::Fullscreen),
        "gpause" => Some(Command::GamePause),
        "extend" => Some(Command::Extend),
        "close" => Some(Command::Close),
        "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}
