use jam_players::clients::IClient;

fn main() {
    let data = jam_players::clients::SampleClient::default()
        .fetch()
        .unwrap();
    let users = jam_players::deserialize(&data).unwrap();
    for user in users {
        println!("{} ({:?})", user.full_name(), user.instruments);
    }
}
