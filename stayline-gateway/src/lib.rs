pub mod client;

pub use client::{ChapaClient, ChapaConfig};
