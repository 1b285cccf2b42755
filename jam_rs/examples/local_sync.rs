// インメモリ行ストアで 2 プロセス同期の流れを確認するサンプル
use jam_rs::mock::MemoryRowStore;
use jam_rs::queue::BandQueueManager;
use jam_rs::store::StateStore;
use jam_rs::sync::{IPushChannel, SyncEngine};
use jam_rs::Band;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let remote = MemoryRowStore::new();

    // 管理側
    let mut admin_store = StateStore::new();
    let mut admin = SyncEngine::new(Vec::new());
    admin.bootstrap(&mut admin_store, &remote).await;

    // 表示側
    let mut kiosk_store = StateStore::new();
    let mut kiosk = SyncEngine::new(Vec::new());
    kiosk.bootstrap(&mut kiosk_store, &remote).await;
    let mut channel = remote.subscribe();

    BandQueueManager::new(&mut admin_store).append(Band::new("The Borrowed Amps", true));
    admin.flush(&mut admin_store, &remote).await;

    let row = channel.next_change().await.unwrap();
    kiosk.absorb(&mut kiosk_store, &row);

    println!("kiosk sees: {}", kiosk_store.bands()[0].name);
}
