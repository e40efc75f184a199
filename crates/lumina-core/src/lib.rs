pub mod card;
pub mod clipboard;
pub mod config;
pub mod form;
pub mod studio;

pub use card::*;
pub use clipboard::*;
pub use config::*;
pub use form::*;
pub use studio::*;
