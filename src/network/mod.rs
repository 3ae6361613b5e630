pub mod client;
pub mod protocol;
pub mod transport;

pub use client::PusherClient;
