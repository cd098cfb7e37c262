pub mod attachment;
pub mod chat_stream;
pub mod config;
pub mod conversation;
pub mod message;
pub mod persona;
pub mod reducer;
pub mod session;
pub mod store;
