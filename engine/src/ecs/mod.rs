pub mod archetype;
pub mod component;
pub mod entity;
pub mod error;
pub mod storage;
pub(crate) mod util;

pub use component::{Bundle, Component, Signature, Values};
pub use entity::Entity;
pub use error::{Error, Result};
pub use storage::{Config, Storage};

pub use rusty_macros::Component;
