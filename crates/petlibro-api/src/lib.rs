// petlibro-api: Async Rust client for the PETLIBRO cloud API

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{Credentials, Region, hash_password};
pub use client::PetLibroClient;
pub use error::Error;
pub use models::{DeviceRecord, RawFields};
pub use transport::TransportConfig;
