use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod http;
pub mod live;
pub mod mock;
pub mod overlay;
pub mod queue;
pub mod store;
pub mod sync;
pub mod timer;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct InstrumentSet: u32 {
        const VOICE  = 0b000001;
        const GUITAR = 0b000010;
        const BASS   = 0b000100;
        const DRUMS  = 0b001000;
        const KEYS   = 0b010000;
        const OTHER  = 0b100000;
    }
}

// 楽器の固定一覧
// ロースター上は複数所持、バンド内では 1 人 1 役
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instrument {
    Voice,
    Guitar,
    Bass,
    Drums,
    Keys,
    Other,
}

impl Instrument {
    pub const ALL: [Instrument; 6] = [
        Instrument::Voice,
        Instrument::Guitar,
        Instrument::Bass,
        Instrument::Drums,
        Instrument::Keys,
        Instrument::Other,
    ];

    pub fn flag(&self) -> InstrumentSet {
        match self {
            Instrument::Voice => InstrumentSet::VOICE,
            Instrument::Guitar => InstrumentSet::GUITAR,
            Instrument::Bass => InstrumentSet::BASS,
            Instrument::Drums => InstrumentSet::DRUMS,
            Instrument::Keys => InstrumentSet::KEYS,
            Instrument::Other => InstrumentSet::OTHER,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Instrument::Voice => "Voice",
            Instrument::Guitar => "Guitar",
            Instrument::Bass => "Bass",
            Instrument::Drums => "Drums",
            Instrument::Keys => "Keys",
            Instrument::Other => "Other",
        }
    }

    pub fn parse(input: &str) -> Option<Instrument> {
        match input.to_ascii_lowercase().as_str() {
            "voice" => Some(Instrument::Voice),
            "guitar" => Some(Instrument::Guitar),
            "bass" => Some(Instrument::Bass),
            "drums" => Some(Instrument::Drums),
            "keys" => Some(Instrument::Keys),
            "other" => Some(Instrument::Other),
            _ => None,
        }
    }
}

impl FromIterator<Instrument> for InstrumentSet {
    fn from_iter<T: IntoIterator<Item = Instrument>>(iter: T) -> Self {
        iter.into_iter()
            .fold(InstrumentSet::empty(), |set, instrument| {
                set | instrument.flag()
            })
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandId {
    uuid: Uuid,
}

impl BandId {
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
        }
    }
}

impl Default for BandId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.uuid.fmt(f)
    }
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId {
    uuid: Uuid,
}

impl UserId {
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
        }
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.uuid.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "PAUSED")]
    Paused,
}

// ロースター上のユーザー
// assigned_role は持たない。バンドに組み込むときのスナップショット側にだけ付く
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub stage_name: String,

    // 空にはならない想定
    pub instruments: Vec<Instrument>,

    // Other を選んだときだけ意味を持つ自由記述ラベル
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instrument: Option<String>,

    pub status: UserStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_seed: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,

    // epoch ミリ秒
    pub created_at: i64,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    // 申告済みの楽器かどうか
    pub fn plays(&self, instrument: Instrument) -> bool {
        self.instruments.contains(&instrument)
    }

    pub fn instrument_set(&self) -> InstrumentSet {
        self.instruments.iter().copied().collect()
    }
}

// バンドに埋め込まれるメンバースナップショット
// ロースターを後から編集しても過去の編成は変わらない
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandMember {
    pub user: User,
    pub assigned_role: Instrument,
}

impl BandMember {
    // 表示用のロール名。Other は自由記述ラベルを優先する
    pub fn role_label(&self) -> &str {
        if self.assigned_role == Instrument::Other {
            if let Some(label) = &self.user.custom_instrument {
                return label;
            }
        }
        self.assigned_role.label()
    }
}

pub const DEFAULT_DURATION_MINUTES: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: BandId,
    pub name: String,
    pub members: Vec<BandMember>,
    pub is_manual: bool,

    // 分。小数も可 (6.5 など)
    pub duration_minutes: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    // アーカイブ時にだけ刻印される
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Band {
    pub fn new<T: Into<String>>(name: T, is_manual: bool) -> Self {
        Self {
            id: BandId::new(),
            name: name.into(),
            members: Vec::new(),
            is_manual,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            start_time: None,
            end_time: None,
        }
    }

    pub fn has_member(&self, user_id: UserId) -> bool {
        self.members.iter().any(|member| member.user.id == user_id)
    }

    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|member| member.user.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Band, Instrument, InstrumentSet, User, UserId, UserStatus};

    fn user(instruments: Vec<Instrument>) -> User {
        User {
            id: UserId::new(),
            first_name: "Mina".to_string(),
            last_name: "Sato".to_string(),
            stage_name: "mina".to_string(),
            instruments,
            custom_instrument: None,
            status: UserStatus::Active,
            avatar_seed: None,
            email: None,
            phone_number: None,
            instagram: None,
            created_at: 0,
        }
    }

    #[test]
    fn instrument_parse_is_case_insensitive() {
        assert_eq!(Instrument::parse("VOICE"), Some(Instrument::Voice));
        assert_eq!(Instrument::parse("keys"), Some(Instrument::Keys));
        assert_eq!(Instrument::parse("flute"), None);
    }

    #[test]
    fn instrument_set_from_declared() {
        let user = user(vec![Instrument::Voice, Instrument::Drums]);
        let set = user.instrument_set();
        assert!(set.contains(InstrumentSet::VOICE));
        assert!(set.contains(InstrumentSet::DRUMS));
        assert!(!set.contains(InstrumentSet::BASS));
    }

    #[test]
    fn user_round_trip() {
        let user = user(vec![Instrument::Guitar]);
        let json = serde_json::to_string(&user).unwrap();
        let parsed: User = serde_json::from_str(&json).unwrap();
        assert_eq!(user, parsed);
    }

    #[test]
    fn band_member_lookup() {
        let user = user(vec![Instrument::Bass]);
        let id = user.id;
        let mut band = Band::new("band_x", true);
        band.members.push(super::BandMember {
            user,
            assigned_role: Instrument::Bass,
        });

        assert!(band.has_member(id));
        assert!(!band.has_member(UserId::new()));
    }
}
