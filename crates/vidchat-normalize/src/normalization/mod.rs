//! Transform functions and the normalizers built on the engine.

pub mod attachment;
pub mod author;
pub mod message;
pub mod reaction;
pub mod replay;
pub mod scalar;
pub mod text;
