pub mod version;
pub mod webhook;
