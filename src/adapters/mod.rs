//! Adapters implementing domain ports.
//!
//! Infrastructure implementations of the traits defined in the ports
//! module: engine sessions (in-process tables and external processes), the
//! stdio protocol server, and policy storage.

pub mod in_memory_repository;
pub mod msgpack_repository;
pub mod process_engine;
pub mod protocol;
pub mod stdio_server;
pub mod table_engine;

pub use in_memory_repository::InMemoryRepository;
pub use msgpack_repository::MsgPackRepository;
pub use process_engine::{DEFAULT_ROUND_TRIP_TIMEOUT, ProcessEngine, ProcessEngineLoader};
pub use stdio_server::serve;
pub use table_engine::{TableEngine, TableEngineLoader};
