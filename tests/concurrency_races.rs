//! The races the engine must win: competing buyers on one offer, and
//! interleaved actions against one player.

use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use petden::game::{GameEngine, GameError, GameSettings, GameStoreBuilder};

fn setup() -> (TempDir, Arc<GameEngine>) {
    let dir = TempDir::new().expect("tempdir");
    let store = GameStoreBuilder::new(dir.path()).open().expect("store");
    (dir, Arc::new(GameEngine::new(store, GameSettings::default())))
}

#[test]
fn exactly_one_concurrent_buyer_wins_an_offer() {
    let (_dir, engine) = setup();
    let (seller_id, seller) = engine.register("Seller", "Pet").expect("seller");
    let offer = engine
        .create_offer(&seller_id, &seller.inventory[0].id, 40)
        .expect("offer");

    let buyer_ids: Vec<String> = (0..6)
        .map(|i| {
            let (id, _) = engine
                .register(&format!("Buyer{}", i), "Pet")
                .expect("buyer");
            id
        })
        .collect();

    let handles: Vec<_> = buyer_ids
        .iter()
        .map(|buyer_id| {
            let engine = Arc::clone(&engine);
            let buyer_id = buyer_id.clone();
            let offer_id = offer.id;
            thread::spawn(move || engine.buy_offer(&buyer_id, &offer_id))
        })
        .collect();

    let mut wins = 0;
    let mut losses = 0;
    for handle in handles {
        match handle.join().expect("join") {
            Ok(_) => wins += 1,
            Err(GameError::OfferAlreadyClosed(_)) => losses += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(wins, 1, "exactly one buyer must win");
    assert_eq!(losses, 5);

    // One debit, one credit, one item. Losers are untouched.
    let store = engine.store();
    let seller = store.get_player(&seller_id).expect("seller");
    assert_eq!(seller.coins, 120 + 40);

    let mut winners = 0;
    for buyer_id in &buyer_ids {
        let buyer = store.get_player(buyer_id).expect("buyer");
        match buyer.coins {
            80 => {
                winners += 1;
                assert_eq!(buyer.inventory.len(), 3); // 2 starters + bought item
            }
            120 => assert_eq!(buyer.inventory.len(), 2),
            other => panic!("impossible balance {}", other),
        }
    }
    assert_eq!(winners, 1);
}

#[test]
fn actions_on_one_player_are_serialized() {
    let (_dir, engine) = setup();
    let (player_id, _) = engine.register("Alice", "Rex").expect("register");

    // Rest always succeeds and awards 5 xp; any lost update would show
    // up as missing experience.
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let player_id = player_id.clone();
            thread::spawn(move || engine.rest(&player_id).expect("rest"))
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }

    let snapshot = engine.snapshot(&player_id).expect("snapshot");
    assert_eq!(snapshot.experience, 16 * 5);
    assert_eq!(snapshot.level, 1);
}

#[test]
fn concurrent_consumers_cannot_double_spend_one_item() {
    let (_dir, engine) = setup();
    let (player_id, snapshot) = engine.register("Alice", "Rex").expect("register");
    let item_id = snapshot.inventory[0].id;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let player_id = player_id.clone();
            thread::spawn(move || engine.use_item(&player_id, &item_id))
        })
        .collect();

    let mut consumed = 0;
    for handle in handles {
        match handle.join().expect("join") {
            Ok(_) => consumed += 1,
            Err(GameError::ItemNotFound(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(consumed, 1, "an instance can only be consumed once");
}

#[test]
fn cancel_races_buy_without_duplicating_the_item() {
    let (_dir, engine) = setup();
    let (seller_id, seller) = engine.register("Seller", "Pet").expect("seller");
    let (buyer_id, _) = engine.register("Buyer", "Pet").expect("buyer");
    let item_id = seller.inventory[0].id;
    let offer = engine
        .create_offer(&seller_id, &item_id, 40)
        .expect("offer");

    let buy_handle = {
        let engine = Arc::clone(&engine);
        let buyer_id = buyer_id.clone();
        let offer_id = offer.id;
        thread::spawn(move || engine.buy_offer(&buyer_id, &offer_id))
    };
    let cancel_handle = {
        let engine = Arc::clone(&engine);
        let seller_id = seller_id.clone();
        let offer_id = offer.id;
        thread::spawn(move || engine.cancel_offer(&seller_id, &offer_id))
    };

    let buy = buy_handle.join().expect("join");
    let cancel = cancel_handle.join().expect("join");
    assert!(
        buy.is_ok() ^ cancel.is_ok(),
        "exactly one of buy/cancel may win"
    );

    // The item exists exactly once, wherever it ended up.
    let store = engine.store();
    let buyer_has = store
        .get_player(&buyer_id)
        .expect("buyer")
        .inventory
        .iter()
        .filter(|item| item.id == item_id)
        .count();
    let seller_has = store
        .get_player(&seller_id)
        .expect("seller")
        .inventory
        .iter()
        .filter(|item| item.id == item_id)
        .count();
    assert_eq!(buyer_has + seller_has, 1);
}
