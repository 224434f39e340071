//! Terminal client for talking to a persona made from your own photo.
//!
//! Upload a photo, name a role ("queen", "space pirate") and the photo is
//! redrawn as that character. From then on every line you type is answered
//! in character, in whatever language you wrote in, and spoken aloud with a
//! matching on-device voice. Replies can also be rendered as talking-avatar
//! videos through the `persona-server` proxy.

pub mod avatar;
pub mod config;
pub mod error;
pub mod repl;
pub mod session;
pub mod upload;

pub use avatar::{AvatarProxyClient, ProxyError};
pub use config::{load_config, StudioConfig};
pub use error::StudioError;
pub use repl::{parse_command, Command, Repl};
pub use session::{Failure, Outcome, Session, SessionError, SpeechStatus};
pub use upload::{read_image, write_image, UploadError, MAX_UPLOAD_SIZE};
