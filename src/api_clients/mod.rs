pub mod client_trait;
pub mod error_handling;
pub mod server_client;

pub use client_trait::{ByteStream, GenerationTransport};
pub use server_client::ServerApiClient;
