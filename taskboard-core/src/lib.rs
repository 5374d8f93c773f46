/// Task board core: boards -> lists -> cards with integer positions.
///
/// The ordering engines (`position`, `reorder`, `moves`) are pure functions over
/// the flat collections in `types::BoardData`. `storage::BoardStore` wraps them
/// with locking and persistence; `client` holds the optimistic-update controller
/// that front ends drive.
pub mod client;
pub mod config;
pub mod events;
pub mod moves;
pub mod position;
pub mod reorder;
pub mod storage;
pub mod types;
