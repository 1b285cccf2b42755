mod application;

use application::App;
use clap::Parser;
use jam_rs::http::RowStoreClient;
use jam_rs::mock::MemoryRowStore;

/// ステージ表示。共有ストアのキューを映し、カウントダウンを回す
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
}

// 協調スケジューリングの 1 スレッドで全イベントを直列化する
#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.local {
        let remote = MemoryRowStore::new();
        let channel = remote.subscribe();
        App::run(remote, channel).await;
    } else {
        let client = RowStoreClient::new(&args.store_url);
        let channel = client.changes();
        App::run(client, channel).await;
    }
}
