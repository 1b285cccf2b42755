use std::collections::HashSet;

use rand::seq::SliceRandom;

// バンド名の固定プール
pub const NAME_POOL: [&str; 24] = [
    "The Borrowed Amps",
    "Feedback Committee",
    "Soundcheck Forever",
    "The Wrong Key Society",
    "Encore Deniers",
    "Half-Past Tempo",
    "The Capo Thieves",
    "Waiting for the Bassist",
    "Plan B Minor",
    "The Last Rehearsal",
    "Accidental Harmony",
    "Free Beer Finale",
    "The Detuned",
    "Two Chords Short",
    "Stage Fright Orchestra",
    "The Cowbell Surplus",
    "Almost in Tune",
    "The Setlist Gamblers",
    "Noise Complaint",
    "Fourth Wall Feedback",
    "The Spare Drummers",
    "Slightly Sharp",
    "Van Full of Cables",
    "The Sunday Shredders",
];

// 使用済みでない名前をプールから 1 つ返す
// プールが尽きたら連番名に落ちる
pub fn unique_band_name(used_names: &HashSet<String>) -> String {
    let mut pool: Vec<&str> = NAME_POOL.to_vec();
    pool.shuffle(&mut rand::thread_rng());

    for name in pool {
        if !used_names.contains(name) {
            return name.to_string();
        }
    }

    let mut index = used_names.len() + 1;
    loop {
        let name = format!("Jam Session #{index}");
        if !used_names.contains(&name) {
            return name;
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{unique_band_name, NAME_POOL};

    #[test]
    fn avoids_used_names() {
        let mut used = HashSet::new();
        for _ in 0..NAME_POOL.len() {
            let name = unique_band_name(&used);
            assert!(!used.contains(&name));
            used.insert(name);
        }

        // プールを使い切った
        for name in NAME_POOL {
            assert!(used.contains(name));
        }
    }

    #[test]
    fn exhausted_pool_falls_back_to_numbered() {
        let used: HashSet<String> = NAME_POOL.iter().map(|name| name.to_string()).collect();

        let name = unique_band_name(&used);
        assert!(name.starts_with("Jam Session #"));

        let mut used = used;
        used.insert(name.clone());
        let next = unique_band_name(&used);
        assert_ne!(name, next);
    }
}
