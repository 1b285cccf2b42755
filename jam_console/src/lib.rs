use jam_rs::Instrument;

// 手動バンドの指定をほどく
// ex. "band_name/rei=Voice/tama=Drums"
// 名前を空にするとプールから自動で付ける
pub fn parse_band_spec(input: &str) -> Option<(String, Vec<(String, Instrument)>)> {
    let mut inputs = input.split('/');
    let band_name = inputs.next()?.to_string();

    let mut members = Vec::new();
    for entry in inputs {
        let (stage_name, role) = entry.split_once('=')?;
        let role = Instrument::parse(role)?;
        members.push((stage_name.to_string(), role));
    }

    Some((band_name, members))
}

#[cfg(test)]
mod tests {
    use jam_rs::Instrument;

    use crate::parse_band_spec;

    #[test]
    fn simple_parse_band_spec() {
        let (name, members) = parse_band_spec("band_x/rei=Voice/tama=drums").unwrap();

        assert_eq!(name, "band_x");
        assert_eq!(
            members,
            vec![
                ("rei".to_string(), Instrument::Voice),
                ("tama".to_string(), Instrument::Drums),
            ]
        );
    }

    #[test]
    fn empty_member_list_is_valid() {
        let (name, members) = parse_band_spec("band_x").unwrap();
        assert_eq!(name, "band_x");
        assert!(members.is_empty());
    }

    #[test]
    fn malformed_spec_is_rejected() {
        assert!(parse_band_spec("band_x/rei").is_none());
        assert!(parse_band_spec("band_x/rei=Theremin").is_none());
    }
}
