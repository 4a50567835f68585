pub mod cards;
pub mod handlers;
pub mod middleware;
pub mod process;
pub mod routes;
pub mod ws;

pub use routes::create_router;
pub use ws::{spawn_status_pusher, WsBroadcaster, WsMessage};
