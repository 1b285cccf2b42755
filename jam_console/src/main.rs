use std::collections::HashSet;

use clap::{Parser, Subcommand};
use jam_console::parse_band_spec;
use jam_players::band_gen::generate_next_band;
use jam_players::demo::demo_users;
use jam_players::names::unique_band_name;
use jam_players::stats;
use jam_rs::http::RowStoreClient;
use jam_rs::mock::MemoryRowStore;
use jam_rs::queue::{snapshot_member, BandQueueManager};
use jam_rs::store::StateStore;
use jam_rs::sync::{IPushChannel, IRowStore, SyncEngine};
use jam_rs::{Band, UserStatus};

/// 管理コンソール。キューとロースターを共有ストア越しに編集する
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// 行ストアのベース URL
    #[arg(
        long = "store",
        env = "JAM_STORE_URL",
        default_value = "http://localhost:8787"
    )]
    store_url: String,

    /// 共有ストアを使わないローカル確認モード
    #[arg(long)]
    local: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// ロースターの操作
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// キューの操作
    Bands {
        #[command(subcommand)]
        command: BandsCommand,
    },
    /// 出演統計
    Stats,
    /// 変更通知を購読して表示し続ける
    Watch,
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List,
    /// 登録フォームの CSV を取り込む
    Import {
        #[arg(long)]
        csv: std::path::PathBuf,
    },
    Pause {
        #[arg(long)]
        stage: String,
    },
    Resume {
        #[arg(long)]
        stage: String,
    },
    /// 削除は取り消せない
    Remove {
        #[arg(long)]
        stage: String,

        /// 確認。付けない限り何もしない
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum BandsCommand {
    List,
    /// ランダム編成を 1 つ末尾に追加する
    Auto {
        #[arg(long)]
        size: Option<usize>,
    },
    /// ex. --band band_x/rei=Voice/tama=Drums (名前を空にするとプールから採番)
    Manual {
        #[arg(short = 'b', long = "band")]
        band: String,
    },
    /// 既存バンドの編成を丸ごと差し替える。ex. --members rei=Voice/tama=Drums
    Members {
        #[arg(long)]
        index: usize,
        #[arg(long)]
        members: String,
    },
    Rename {
        #[arg(long)]
        index: usize,
        #[arg(long)]
        name: String,
    },
    /// 名前をプールから引き直す
    ShuffleName {
        #[arg(long)]
        index: usize,
    },
    Duration {
        #[arg(long)]
        index: usize,
        #[arg(long)]
        minutes: f64,
    },
    Reorder {
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
    },
    /// 削除は取り消せない
    Remove {
        #[arg(long)]
        index: usize,

        /// 確認。付けない限り何もしない
        #[arg(long)]
        yes: bool,
    },
    /// 先頭をアーカイブして次のバンドへ
    Advance {
        /// 確認。付けない限り何もしない
        #[arg(long)]
        yes: bool,
    },
}

fn run_users(store: &mut StateStore, command: UsersCommand) {
    match command {
        UsersCommand::List => {
            for user in store.users() {
                let roles: Vec<&str> = user
                    .instruments
                    .iter()
                    .map(|instrument| {
                        if *instrument == jam_rs::Instrument::Other {
                            user.custom_instrument
                                .as_deref()
                                .unwrap_or(instrument.label())
                        } else {
                            instrument.label()
                        }
                    })
                    .collect();
                let status = match user.status {
                    UserStatus::Active => "ACTIVE",
                    UserStatus::Paused => "PAUSED",
                };
                println!(
                    "@{:<12} {:<20} {:<6} {}",
                    user.stage_name,
                    user.full_name(),
                    status,
                    roles.join(", ")
                );
            }
        }
        UsersCommand::Import { csv } => {
            let data = match std::fs::read_to_string(&csv) {
                Ok(data) => data,
                Err(error) => {
                    eprintln!("failed to read {}: {error}", csv.display());
                    return;
                }
            };
            let imported = match jam_players::deserialize(&data) {
                Ok(imported) => imported,
                Err(error) => {
                    eprintln!("failed to parse {}: {error}", csv.display());
                    return;
                }
            };

            let known: HashSet<String> = store
                .users()
                .iter()
                .map(|user| user.stage_name.clone())
                .collect();
            let fresh: Vec<_> = imported
                .into_iter()
                .filter(|user| !known.contains(&user.stage_name))
                .collect();

            println!("importing {} users", fresh.len());
            store.with_users(|users| users.extend(fresh));
        }
        UsersCommand::Pause { stage } => set_status(store, &stage, UserStatus::Paused),
        UsersCommand::Resume { stage } => set_status(store, &stage, UserStatus::Active),
        UsersCommand::Remove { stage, yes } => {
            if !yes {
                println!("this cannot be undone, pass --yes to confirm");
                return;
            }

            let removed = store.with_users(|users| {
                let before = users.len();
                users.retain(|user| user.stage_name != stage);
                before - users.len()
            });
            println!("removed {removed} user(s)");
        }
    }
}

fn set_status(store: &mut StateStore, stage: &str, status: UserStatus) {
    let found = store.with_users(|users| {
        let Some(user) = users.iter_mut().find(|user| user.stage_name == stage) else {
            return false;
        };
        user.status = status;
        true
    });

    if !found {
        eprintln!("no user with stage name @{stage}");
    }
}

fn run_bands(store: &mut StateStore, command: BandsCommand) {
    match command {
        BandsCommand::List => {
            if store.bands().is_empty() {
                println!("queue is empty");
                return;
            }
            for (index, band) in store.bands().iter().enumerate() {
                let marker = if index == 0 { " <- on stage" } else { "" };
                let members: Vec<String> = band
                    .members
                    .iter()
                    .map(|member| {
                        format!("{} ({})", member.user.stage_name, member.role_label())
                    })
                    .collect();
                println!(
                    "#{index} {:<28} {:>5} min  [{}]{}{}",
                    band.name,
                    band.duration_minutes,
                    members.join(", "),
                    if band.is_manual { " (manual)" } else { "" },
                    marker
                );
            }
        }
        BandsCommand::Auto { size } => {
            let band = generate_next_band(store.users(), store.bands(), store.history(), size);
            match band {
                Some(band) => {
                    println!("added {}", band.name);
                    BandQueueManager::new(store).append(band);
                }
                None => eprintln!(
                    "could not form a band, check active drummers/bassists in the roster"
                ),
            }
        }
        BandsCommand::Manual { band } => {
            let Some((name, member_specs)) = parse_band_spec(&band) else {
                eprintln!("malformed band spec: {band}");
                return;
            };

            let mut members = Vec::new();
            for (stage, role) in member_specs {
                let Some(user) = store.users().iter().find(|user| user.stage_name == stage)
                else {
                    eprintln!("no user with stage name @{stage}");
                    return;
                };
                match snapshot_member(user, role) {
                    Ok(member) => members.push(member),
                    Err(error) => {
                        eprintln!("{error}");
                        return;
                    }
                }
            }

            let name = if name.is_empty() {
                unique_band_name(&used_names(store))
            } else {
                name
            };

            let mut new_band = Band::new(name, true);
            new_band.members = members;
            println!("added {}", new_band.name);
            BandQueueManager::new(store).append(new_band);
        }
        BandsCommand::Members { index, members } => {
            let Some(id) = store.bands().get(index).map(|band| band.id) else {
                eprintln!("no band at index {index}");
                return;
            };

            // 先頭にダミーのバンド名を足してスペックとして読む。空なら全員降ろす
            let spec = if members.is_empty() {
                "_".to_string()
            } else {
                format!("_/{members}")
            };
            let Some((_, member_specs)) = parse_band_spec(&spec) else {
                eprintln!("malformed member spec: {members}");
                return;
            };

            let mut resolved = Vec::new();
            for (stage, role) in member_specs {
                let Some(user) = store.users().iter().find(|user| user.stage_name == stage)
                else {
                    eprintln!("no user with stage name @{stage}");
                    return;
                };
                resolved.push((user.clone(), role));
            }

            match BandQueueManager::new(store).set_members(id, &resolved) {
                Ok(true) => println!("updated lineup ({} members)", resolved.len()),
                Ok(false) => eprintln!("no band at index {index}"),
                Err(error) => eprintln!("{error}"),
            }
        }
        BandsCommand::Rename { index, name } => {
            let Some(id) = store.bands().get(index).map(|band| band.id) else {
                eprintln!("no band at index {index}");
                return;
            };
            BandQueueManager::new(store).rename(id, &name);
        }
        BandsCommand::ShuffleName { index } => {
            let Some(id) = store.bands().get(index).map(|band| band.id) else {
                eprintln!("no band at index {index}");
                return;
            };
            let name = unique_band_name(&used_names(store));
            println!("renamed to {name}");
            BandQueueManager::new(store).rename(id, &name);
        }
        BandsCommand::Duration { index, minutes } => {
            let Some(id) = store.bands().get(index).map(|band| band.id) else {
                eprintln!("no band at index {index}");
                return;
            };
            BandQueueManager::new(store).set_duration(id, minutes);
        }
        BandsCommand::Reorder { from, to } => {
            if !BandQueueManager::new(store).reorder(from, to) {
                eprintln!("nothing to reorder");
            }
        }
        BandsCommand::Remove { index, yes } => {
            if !yes {
                println!("this cannot be undone, pass --yes to confirm");
                return;
            }
            match BandQueueManager::new(store).remove_at(index) {
                Some(band) => println!("removed {}", band.name),
                None => eprintln!("no band at index {index}"),
            }
        }
        BandsCommand::Advance { yes } => {
            if !yes {
                println!("archives the band on stage, pass --yes to confirm");
                return;
            }
            let archived = BandQueueManager::new(store).archive_head();
            match archived {
                Some(_) => println!(
                    "archived, {} band(s) left in the queue",
                    store.bands().len()
                ),
                None => println!("queue is empty"),
            }
        }
    }
}

fn used_names(store: &StateStore) -> HashSet<String> {
    store
        .bands()
        .iter()
        .chain(store.history().iter())
        .map(|band| band.name.clone())
        .collect()
}

fn run_stats(store: &StateStore) {
    println!("-- top players --");
    for (user, count) in stats::top_players(store.users(), store.bands(), store.history())
        .into_iter()
        .take(5)
    {
        println!("{:<20} {count} jam(s)", user.full_name());
    }

    println!("-- instruments --");
    for (label, count) in stats::instrument_counts(store.bands(), store.history()) {
        println!("{label:<20} {count}");
    }
}

async fn run<TStore, TChannel>(client: TStore, mut channel: TChannel, command: Command)
where
    TStore: IRowStore,
    TChannel: IPushChannel,
{
    let mut store = StateStore::new();
    let mut engine = SyncEngine::new(demo_users());

    engine.bootstrap(&mut store, &client).await;
    if !engine.is_synchronized() {
        eprintln!("warning: store unreachable, changes will stay local");
    }

    match command {
        Command::Users { command } => run_users(&mut store, command),
        Command::Bands { command } => run_bands(&mut store, command),
        Command::Stats => run_stats(&store),
        Command::Watch => {
            println!("watching for changes, ctrl-c to stop");
            while let Some(row) = channel.next_change().await {
                let key = row.key.clone();
                if engine.absorb(&mut store, &row) {
                    println!(
                        "adopted {key}: {} users / {} queued / {} archived",
                        store.users().len(),
                        store.bands().len(),
                        store.history().len()
                    );
                }
            }
            return;
        }
    }

    engine.flush(&mut store, &client).await;
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.local {
        let remote = MemoryRowStore::new();
        let channel = remote.subscribe();
        run(remote, channel, args.command).await;
    } else {
        let client = RowStoreClient::new(&args.store_url);
        let channel = client.changes();
        run(client, channel, args.command).await;
    }
}
