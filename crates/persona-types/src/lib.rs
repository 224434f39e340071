//! Shared types for the persona studio workspace.
//!
//! Everything here is transient state: an uploaded or generated image, the
//! free-text role the user picked, the structured reply of a chat turn, and
//! the body of an avatar-video request. Nothing is persisted.
//!
//! The other crates depend on `persona-types` for these definitions so the
//! client and the proxy agree on the wire shapes without depending on each
//! other.

pub mod chat;
pub mod image;
pub mod role;

pub use chat::{Author, ChatReply, ConversationState, TalkRequest, Turn, DEFAULT_LANGUAGE};
pub use image::{
    detect_mime, extension_for, mime_from_extension, EncodedImage, ImageError, SUPPORTED_MIME_TYPES,
};
pub use role::{Gender, Role, RoleError, MAX_ROLE_CHARS};
