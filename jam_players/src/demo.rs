use chrono::Utc;
use jam_rs::{Instrument, User, UserId, UserStatus};

// 行ストアが空か到達不能なときに敷くデモロースター
// SyncEngine::new に渡して使う
pub fn demo_users() -> Vec<User> {
    let roster: [(&str, &str, &str, &[Instrument]); 8] = [
        ("Rei", "Aoki", "rei", &[Instrument::Voice, Instrument::Guitar]),
        ("Tamaki", "Ito", "tama", &[Instrument::Drums]),
        ("Sora", "Kanda", "sora", &[Instrument::Bass]),
        ("Yui", "Mori", "yui", &[Instrument::Keys, Instrument::Voice]),
        ("Kenta", "Hoshino", "kenta", &[Instrument::Guitar]),
        ("Nao", "Fujii", "nao", &[Instrument::Drums, Instrument::Other]),
        ("Hana", "Seki", "hana", &[Instrument::Voice]),
        ("Riku", "Oda", "riku", &[Instrument::Bass, Instrument::Guitar]),
    ];

    let created_at = Utc::now().timestamp_millis();
    roster
        .into_iter()
        .map(|(first_name, last_name, stage_name, instruments)| User {
            id: UserId::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            stage_name: stage_name.to_string(),
            instruments: instruments.to_vec(),
            custom_instrument: if instruments.contains(&Instrument::Other) {
                Some("Sax".to_string())
            } else {
                None
            },
            status: UserStatus::Active,
            avatar_seed: Some(stage_name.to_string()),
            email: None,
            phone_number: None,
            instagram: None,
            created_at,
        })
        .collect()
}
