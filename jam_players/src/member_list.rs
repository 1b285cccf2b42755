use jam_rs::{InstrumentSet, User};

// 楽器フィルターつきのロースター一覧
pub struct MemberList {
    members: Vec<User>,

    instrument_filter: InstrumentSet,
}

impl MemberList {
    pub fn from_csv(data: &str) -> Result<Self, crate::RosterError> {
        let members = crate::deserialize(data)?;
        Ok(Self::from_users(members))
    }

    pub fn from_users(members: Vec<User>) -> Self {
        Self {
            members,
            instrument_filter: Default::default(),
        }
    }

    pub fn members(&self) -> &[User] {
        &self.members
    }

    pub fn filter(&self) -> InstrumentSet {
        self.instrument_filter
    }

    pub fn add_filter(&mut self, filter: InstrumentSet) {
        self.instrument_filter = self.instrument_filter.union(filter);
    }

    pub fn remove_filter(&mut self, filter: InstrumentSet) {
        self.instrument_filter.remove(filter);
    }

    pub fn clear_instrument_filter(&mut self) {
        self.instrument_filter = InstrumentSet::empty();
    }

    // フィルターが空なら全員、そうでなければ交差する楽器を持つ人だけ
    pub fn filtered(&self) -> impl Iterator<Item = &User> {
        self.members.iter().filter(move |member| {
            self.instrument_filter.is_empty()
                || member
                    .instrument_set()
                    .intersects(self.instrument_filter)
        })
    }
}
