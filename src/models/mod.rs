/*!
Structs used across the aggregation pipeline: IPv6 networks, AS numbers, AS paths and the
prefix records read from routing table dumps.
*/
mod network;
mod route;

pub use network::*;
pub use route::*;
