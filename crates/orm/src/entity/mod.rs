//! Entity Model - identity, core traits, and navigation containers

pub mod core_trait;
pub mod identity;
pub mod reference;

pub use core_trait::*;
pub use identity::*;
pub use reference::*;
