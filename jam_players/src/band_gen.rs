use std::collections::HashSet;

use rand::seq::SliceRandom;

use jam_rs::queue::snapshot_member;
use jam_rs::{Band, BandMember, Instrument, User, UserId};

use crate::names::unique_band_name;
use crate::stats::appearance_counts;

// 編成の下限。これを満たせないときは None
const MIN_BAND_SIZE: usize = 3;

// 直近何組と同一編成を避けるか
const RECENT_WINDOW: usize = 5;

const ASSEMBLY_ATTEMPTS: usize = 12;

// ランダム編成を 1 つ作る
//   - ACTIVE のユーザーだけを使う
//   - Guitar / Bass / Drums / Keys は 1 枠ずつ、Voice / Other は無制限
//   - リズム隊 (Drums と Bass) は必ず 1 人ずつ入れる
//   - 出演回数の少ない人を優先し、直近の編成の完全な再現は避ける
// 条件を満たす編成が作れなければ None
pub fn generate_next_band(
    all_users: &[User],
    active_queue: &[Band],
    history: &[Band],
    desired_size: Option<usize>,
) -> Option<Band> {
    let candidates: Vec<&User> = all_users.iter().filter(|user| user.is_active()).collect();
    if candidates.len() < MIN_BAND_SIZE {
        return None;
    }

    if !candidates.iter().any(|user| user.plays(Instrument::Drums)) {
        return None;
    }
    if !candidates.iter().any(|user| user.plays(Instrument::Bass)) {
        return None;
    }

    let target_size = desired_size
        .unwrap_or(4)
        .clamp(MIN_BAND_SIZE, candidates.len());

    // 出演回数の少ない順。同数はシャッフルで崩す
    let counts = appearance_counts(active_queue, history);
    let recent = recent_lineups(active_queue, history);

    let mut last_attempt = None;
    for _ in 0..ASSEMBLY_ATTEMPTS {
        let mut ordered = candidates.clone();
        ordered.shuffle(&mut rand::thread_rng());
        ordered.sort_by_key(|user| counts.get(&user.id).copied().unwrap_or(0));

        let Some(members) = assemble(&ordered, target_size) else {
            return None;
        };

        let lineup: HashSet<UserId> = members.iter().map(|member| member.user.id).collect();
        let is_repeat = recent.contains(&sorted_ids(&lineup));
        last_attempt = Some(members);
        if !is_repeat {
            break;
        }
    }

    let members = last_attempt?;

    let used_names: HashSet<String> = active_queue
        .iter()
        .chain(history.iter())
        .map(|band| band.name.clone())
        .collect();

    let mut band = Band::new(unique_band_name(&used_names), false);
    band.members = members;
    Some(band)
}

fn sorted_ids(lineup: &HashSet<UserId>) -> Vec<UserId> {
    let mut ids: Vec<UserId> = lineup.iter().copied().collect();
    ids.sort_by_key(|id| id.to_string());
    ids
}

fn recent_lineups(active_queue: &[Band], history: &[Band]) -> Vec<Vec<UserId>> {
    history
        .iter()
        .rev()
        .take(RECENT_WINDOW)
        .chain(active_queue.iter())
        .map(|band| {
            let ids: HashSet<UserId> = band.members.iter().map(|member| member.user.id).collect();
            sorted_ids(&ids)
        })
        .collect()
}

// 並び順どおりに席を埋めていく
// まずリズム隊を確定させ、残りは各自の申告楽器から空いている役を選ぶ
fn assemble(ordered: &[&User], target_size: usize) -> Option<Vec<BandMember>> {
    let mut members: Vec<BandMember> = Vec::new();
    let mut taken_single = HashSet::<Instrument>::new();

    // ドラマーがベース兼任で唯一のベーシストを食い潰さないよう、組で決める
    let mut rhythm = None;
    for drummer in ordered.iter().filter(|user| user.plays(Instrument::Drums)) {
        let bassist = ordered
            .iter()
            .filter(|user| user.id != drummer.id)
            .find(|user| user.plays(Instrument::Bass));
        if let Some(bassist) = bassist {
            rhythm = Some((*drummer, *bassist));
            break;
        }
    }

    let (drummer, bassist) = rhythm?;
    members.push(snapshot_member(drummer, Instrument::Drums).ok()?);
    taken_single.insert(Instrument::Drums);
    members.push(snapshot_member(bassist, Instrument::Bass).ok()?);
    taken_single.insert(Instrument::Bass);

    for user in ordered {
        if members.len() >= target_size {
            break;
        }
        if members.iter().any(|member| member.user.id == user.id) {
            continue;
        }

        let Some(role) = pick_role(user, &taken_single) else {
            continue;
        };

        if role != Instrument::Voice && role != Instrument::Other {
            taken_single.insert(role);
        }
        members.push(snapshot_member(user, role).ok()?);
    }

    if members.len() < MIN_BAND_SIZE {
        return None;
    }

    Some(members)
}

// 空いている 1 枠の役を優先し、なければ Voice / Other
fn pick_role(user: &User, taken_single: &HashSet<Instrument>) -> Option<Instrument> {
    for instrument in &user.instruments {
        match instrument {
            Instrument::Voice | Instrument::Other => continue,
            _ if taken_single.contains(instrument) => continue,
            _ => return Some(*instrument),
        }
    }

    if user.plays(Instrument::Voice) {
        return Some(Instrument::Voice);
    }
    if user.plays(Instrument::Other) {
        return Some(Instrument::Other);
    }

    None
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::generate_next_band;
    use jam_rs::queue::snapshot_member;
    use jam_rs::{Band, Instrument, User, UserId, UserStatus};

    fn player(stage_name: &str, instruments: Vec<Instrument>, status: UserStatus) -> User {
        User {
            id: UserId::new(),
            first_name: stage_name.to_string(),
            last_name: "Gen".to_string(),
            stage_name: stage_name.to_string(),
            instruments,
            custom_instrument: None,
            status,
            avatar_seed: None,
            email: None,
            phone_number: None,
            instagram: None,
            created_at: 0,
        }
    }

    fn quartet() -> Vec<User> {
        vec![
            player("a", vec![Instrument::Drums], UserStatus::Active),
            player("b", vec![Instrument::Bass], UserStatus::Active),
            player("c", vec![Instrument::Voice], UserStatus::Active),
            player("d", vec![Instrument::Voice], UserStatus::Active),
        ]
    }

    #[test]
    fn respects_single_slot_limits() {
        let users = vec![
            player("a", vec![Instrument::Drums], UserStatus::Active),
            player("b", vec![Instrument::Drums, Instrument::Bass], UserStatus::Active),
            player("c", vec![Instrument::Drums, Instrument::Voice], UserStatus::Active),
            player("d", vec![Instrument::Guitar], UserStatus::Active),
        ];

        for _ in 0..20 {
            let band = generate_next_band(&users, &[], &[], Some(4)).unwrap();

            let drummers = band
                .members
                .iter()
                .filter(|member| member.assigned_role == Instrument::Drums)
                .count();
            let bassists = band
                .members
                .iter()
                .filter(|member| member.assigned_role == Instrument::Bass)
                .count();
            assert_eq!(drummers, 1);
            assert_eq!(bassists, 1);
        }
    }

    #[test]
    fn only_active_users_are_selected() {
        let mut users = quartet();
        users.push(player("paused", vec![Instrument::Voice], UserStatus::Paused));

        for _ in 0..10 {
            let band = generate_next_band(&users, &[], &[], Some(5)).unwrap();
            assert!(band
                .members
                .iter()
                .all(|member| member.user.stage_name != "paused"));
        }
    }

    #[test]
    fn missing_rhythm_section_yields_none() {
        let users = vec![
            player("a", vec![Instrument::Voice], UserStatus::Active),
            player("b", vec![Instrument::Guitar], UserStatus::Active),
            player("c", vec![Instrument::Keys], UserStatus::Active),
        ];

        assert!(generate_next_band(&users, &[], &[], None).is_none());
    }

    #[test]
    fn too_few_active_users_yields_none() {
        let users = vec![
            player("a", vec![Instrument::Drums], UserStatus::Active),
            player("b", vec![Instrument::Bass], UserStatus::Active),
        ];

        assert!(generate_next_band(&users, &[], &[], None).is_none());
    }

    #[test]
    fn prefers_players_with_fewer_appearances() {
        let users = quartet();

        // a, b, c は直近で出演済み。空いている d が優先される
        let mut played = Band::new("played", false);
        for (user, role) in [
            (&users[0], Instrument::Drums),
            (&users[1], Instrument::Bass),
            (&users[2], Instrument::Voice),
        ] {
            played.members.push(snapshot_member(user, role).unwrap());
        }
        let history = vec![played];

        let band = generate_next_band(&users, &[], &history, Some(3)).unwrap();
        let lineup: HashSet<String> = band
            .members
            .iter()
            .map(|member| member.user.stage_name.clone())
            .collect();

        assert!(lineup.contains("d"));
    }

    #[test]
    fn name_avoids_queue_and_history() {
        let users = quartet();
        let band = generate_next_band(&users, &[], &[], None).unwrap();

        let mut queue = Vec::new();
        let mut history = Vec::new();
        for _ in 0..5 {
            let next = generate_next_band(&users, &queue, &history, None).unwrap();
            assert!(queue.iter().all(|band: &Band| band.name != next.name));
            assert!(history.iter().all(|band: &Band| band.name != next.name));
            if queue.len() % 2 == 0 {
                queue.push(next);
            } else {
                history.push(next);
            }
        }

        assert!(!band.name.is_empty());
    }
}
