// # sampq-query
//
// SA-MP / open.mp UDP query protocol.
//
// ## Layers
//
// - `codec`: exact wire encode/decode, no I/O
// - `transport`: one request, one reply, bounded by a timeout
// - `adapter`: the `ServerQuery` operations over address strings
//
// ## Usage
//
// ```rust,ignore
// use sampq_core::{CancellationToken, ServerQuery};
// use sampq_query::QueryAdapter;
//
// let adapter = QueryAdapter::new();
// let token = CancellationToken::new();
// let record = adapter.get_full_info("127.0.0.1:7777", &token).await?;
// println!("{} ({}/{})", record.name(), record.players_count(), record.max_players());
// ```

pub mod adapter;
pub mod codec;
pub mod transport;

pub use adapter::{DEFAULT_PLAYER_LIST_LIMIT, QueryAdapter};
pub use codec::{PacketKind, Parsed, ServerInfo, ServerRules};
pub use transport::{Exchange, QueryTransport, UdpTransport, resolve_ipv4};
