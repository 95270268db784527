pub mod app;
pub mod background;
pub mod chat_socket;
pub mod config;
pub mod constants;
pub mod markup;
pub mod message;
pub mod session;
pub mod typewriter;
