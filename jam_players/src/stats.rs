use std::collections::HashMap;

use itertools::Itertools;
use jam_rs::{Band, User, UserId};

// 現在のキューと履歴をまたいだ出演回数
pub fn appearance_counts(queue: &[Band], history: &[Band]) -> HashMap<UserId, usize> {
    let mut counts = HashMap::new();
    for band in history.iter().chain(queue.iter()) {
        for member in &band.members {
            *counts.entry(member.user.id).or_insert(0) += 1;
        }
    }
    counts
}

// 出演回数の多い順のランキング
pub fn top_players<'a>(
    users: &'a [User],
    queue: &[Band],
    history: &[Band],
) -> Vec<(&'a User, usize)> {
    let counts = appearance_counts(queue, history);
    users
        .iter()
        .map(|user| (user, counts.get(&user.id).copied().unwrap_or(0)))
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .collect()
}

// ロール別の演奏回数。Other は自由記述ラベルで数える
pub fn instrument_counts(queue: &[Band], history: &[Band]) -> Vec<(String, usize)> {
    let mut counts = HashMap::<String, usize>::new();
    for band in history.iter().chain(queue.iter()) {
        for member in &band.members {
            *counts.entry(member.role_label().to_string()).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect()
}
