pub mod blocking;
pub mod config;
pub mod digest;
pub mod error;
pub mod issue;
pub mod linear;
pub mod render;
pub mod slack;
pub mod sort;
pub mod state;
pub mod thread;
pub mod week;

pub use error::{DigestError, Result};
