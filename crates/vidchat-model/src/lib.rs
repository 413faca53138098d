//! Output model for normalized video chat records.
//!
//! Every record produced by the retrieval pipeline, live or replayed, has the
//! shape of [`ChatMessage`]. Optional containers (reactions, attachments,
//! reply parents, badge and image lists) are omitted when empty so that
//! absence, not emptiness, signals "no data".

mod lenient;

pub mod attachment;
pub mod author;
pub mod message;

pub use attachment::{Attachment, AttachmentTarget, ReactionType, Reactions};
pub use author::{Author, Badge, Image};
pub use message::{ChatMessage, MessageType};
