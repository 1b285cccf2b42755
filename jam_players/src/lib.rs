pub mod band_gen;
pub mod clients;
pub mod demo;
mod member_list;
pub mod names;
pub mod stats;

use std::collections::HashMap;

use jam_rs::{Instrument, User, UserId, UserStatus};
pub use member_list::MemberList;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

// 登録フォームのエクスポート形式
// 1 行が 1 プロパティで、同じ stage_name の行を 1 ユーザーに畳み込む
#[derive(Debug, serde::Deserialize)]
pub struct Record {
    stage_name: String,
    property_name: String,
    value: String,
}

pub fn deserialize(str: &str) -> Result<Vec<User>, RosterError> {
    let mut rdr = csv::Reader::from_reader(str.as_bytes());
    let mut table = HashMap::<String, User>::default();

    // 出力順は初出順で安定させる
    let mut order = Vec::<String>::new();

    for record in rdr.deserialize::<Record>() {
        let record = record?;
        if !table.contains_key(&record.stage_name) {
            order.push(record.stage_name.clone());
            table.insert(
                record.stage_name.clone(),
                User {
                    id: UserId::new(),
                    first_name: String::new(),
                    last_name: String::new(),
                    stage_name: record.stage_name.clone(),
                    instruments: Vec::new(),
                    custom_instrument: None,
                    status: UserStatus::Active,
                    avatar_seed: None,
                    email: None,
                    phone_number: None,
                    instagram: None,
                    created_at: chrono::Utc::now().timestamp_millis(),
                },
            );
        }

        let user = table.get_mut(&record.stage_name).unwrap();
        match &record.property_name as &str {
            "first_name" => user.first_name = record.value,
            "last_name" => user.last_name = record.value,
            "instrument" => {
                match &record.value as &str {
                    "Voice" => user.instruments.push(Instrument::Voice),
                    "Guitar" => user.instruments.push(Instrument::Guitar),
                    "Bass" => user.instruments.push(Instrument::Bass),
                    "Drums" => user.instruments.push(Instrument::Drums),
                    "Keys" => user.instruments.push(Instrument::Keys),
                    "Other" => user.instruments.push(Instrument::Other),
                    unknown => log::warn!("unknown instrument {unknown}, skipping"),
                };
            }
            "custom_instrument" => user.custom_instrument = Some(record.value),
            "status" => {
                user.status = if record.value == "PAUSED" {
                    UserStatus::Paused
                } else {
                    UserStatus::Active
                }
            }
            "avatar" => user.avatar_seed = Some(record.value),
            "email" => user.email = Some(record.value),
            "phone" => user.phone_number = Some(record.value),
            "instagram" => user.instagram = Some(record.value),
            unknown => log::debug!("unknown property {unknown}, skipping"),
        }
    }

    let mut users = Vec::new();
    for stage_name in order {
        let user = table.remove(&stage_name).unwrap();
        if user.instruments.is_empty() {
            // 楽器ゼロのユーザーはロースターに入れない
            log::warn!("{} has no instruments, skipping", user.stage_name);
            continue;
        }
        users.push(user);
    }

    Ok(users)
}
