//! Wire-level request/response types and the dispatcher that maps them
//! onto engine calls.
//!
//! Authentication is resolved upstream by the session gateway; requests
//! arrive here carrying only the opaque `player_id`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::errors::GameError;
use crate::game::types::{CatalogItem, OfferView, PlayerSnapshot};
use crate::game::GameEngine;

/// One client request, tagged by `action`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    Register {
        name: String,
        pet_name: String,
    },
    Snapshot {
        player_id: String,
    },
    Feed {
        player_id: String,
    },
    Play {
        player_id: String,
    },
    Heal {
        player_id: String,
    },
    Rest {
        player_id: String,
    },
    UseItem {
        player_id: String,
        item_id: Uuid,
    },
    Catalog,
    Purchase {
        player_id: String,
        catalog_id: String,
    },
    CreateOffer {
        player_id: String,
        item_id: Uuid,
        price: i64,
    },
    /// Browse open offers. When `player_id` is given, that player's own
    /// offers are filtered out of the listing.
    ListOffers {
        #[serde(default)]
        player_id: Option<String>,
    },
    BuyOffer {
        player_id: String,
        offer_id: Uuid,
    },
    CancelOffer {
        player_id: String,
        offer_id: Uuid,
    },
}

/// One server response, tagged by `status`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Registered {
        player_id: String,
        snapshot: PlayerSnapshot,
    },
    Ok {
        snapshot: PlayerSnapshot,
    },
    Offers {
        offers: Vec<OfferView>,
    },
    Catalog {
        items: Vec<CatalogItem>,
    },
    Error {
        kind: String,
        message: String,
        /// True for infrastructure failures the caller may retry;
        /// business-rule failures are final for that request.
        transient: bool,
    },
}

impl Response {
    fn from_error(error: &GameError) -> Self {
        Self::Error {
            kind: error.kind().to_string(),
            message: error.to_string(),
            transient: error.is_transient(),
        }
    }

    /// For requests that never reached the engine (malformed JSON).
    pub fn bad_request(message: &str) -> Self {
        Self::Error {
            kind: "bad_request".to_string(),
            message: message.to_string(),
            transient: false,
        }
    }
}

fn snapshot_response(result: Result<PlayerSnapshot, GameError>) -> Response {
    match result {
        Ok(snapshot) => Response::Ok { snapshot },
        Err(error) => Response::from_error(&error),
    }
}

/// Execute one request against the engine.
pub fn dispatch(engine: &GameEngine, request: Request) -> Response {
    match request {
        Request::Register { name, pet_name } => match engine.register(&name, &pet_name) {
            Ok((player_id, snapshot)) => Response::Registered {
                player_id,
                snapshot,
            },
            Err(error) => Response::from_error(&error),
        },
        Request::Snapshot { player_id } => snapshot_response(engine.snapshot(&player_id)),
        Request::Feed { player_id } => snapshot_response(engine.feed(&player_id)),
        Request::Play { player_id } => snapshot_response(engine.play(&player_id)),
        Request::Heal { player_id } => snapshot_response(engine.heal(&player_id)),
        Request::Rest { player_id } => snapshot_response(engine.rest(&player_id)),
        Request::UseItem { player_id, item_id } => {
            snapshot_response(engine.use_item(&player_id, &item_id))
        }
        Request::Catalog => match engine.catalog() {
            Ok(items) => Response::Catalog { items },
            Err(error) => Response::from_error(&error),
        },
        Request::Purchase {
            player_id,
            catalog_id,
        } => snapshot_response(engine.purchase(&player_id, &catalog_id)),
        Request::CreateOffer {
            player_id,
            item_id,
            price,
        } => match engine.create_offer(&player_id, &item_id, price) {
            // Offer creation returns the refreshed seller snapshot so the
            // client sees the item leave the inventory.
            Ok(_) => snapshot_response(engine.snapshot(&player_id)),
            Err(error) => Response::from_error(&error),
        },
        Request::ListOffers { player_id } => match engine.list_offers(player_id.as_deref()) {
            Ok(offers) => Response::Offers { offers },
            Err(error) => Response::from_error(&error),
        },
        Request::BuyOffer {
            player_id,
            offer_id,
        } => snapshot_response(engine.buy_offer(&player_id, &offer_id)),
        Request::CancelOffer {
            player_id,
            offer_id,
        } => snapshot_response(engine.cancel_offer(&player_id, &offer_id)),
    }
}
