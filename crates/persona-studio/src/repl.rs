//! Interactive terminal front end for a [`Session`].

use crate::avatar::{AvatarProxyClient, ProxyError};
use crate::error::StudioError;
use crate::session::{Outcome, Session, SpeechStatus};
use crate::upload::{read_image, write_image};
use persona_types::{Author, ConversationState, Role};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
Commands:
  <text>           set the role (first time) or talk to the persona
  <Enter>          retry the last failed input
  /upload <path>   load a new photo (JPEG, PNG, GIF or WebP, up to 10 MiB)
  /save <path>     write the current image to disk
  /reset           drop the persona and restore the original photo
  /history         show the conversation so far
  /video           render the last reply as a talking-avatar video
  /help            show this help
  /quit            exit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    Empty,
    Submit(String),
    Upload(PathBuf),
    Save(PathBuf),
    Reset,
    History,
    Video,
    Help,
    Quit,
    /// A slash command that is unknown or missing its argument.
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Submit(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match (name, arg.is_empty()) {
        ("upload", false) => Command::Upload(PathBuf::from(arg)),
        ("save", false) => Command::Save(PathBuf::from(arg)),
        ("upload" | "save", true) => Command::Invalid(format!("usage: /{} <path>", name)),
        ("reset", _) => Command::Reset,
        ("history", _) => Command::History,
        ("video", _) => Command::Video,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        _ => Command::Invalid(format!("unknown command /{}; try /help", name)),
    }
}

/// REPL state.
pub struct Repl {
    session: Arc<Session>,
    proxy: Option<AvatarProxyClient>,
    /// Input handed back by the last failed submission.
    pending: Option<String>,
}

impl Repl {
    pub fn new(session: Arc<Session>, proxy: Option<AvatarProxyClient>) -> Self {
        Self {
            session,
            proxy,
            pending: None,
        }
    }

    /// Input waiting to be retried, if the last submission failed.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Reads commands from `input` until `/quit` or end of input.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<(), StudioError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "Persona Studio. Type /help for commands.")?;
        if self.session.current_image().is_none() {
            writeln!(out, "Start with /upload <path> to load a photo.")?;
        } else {
            writeln!(out, "Photo loaded. Enter a role, e.g. \"queen\" or \"space pirate\".")?;
        }

        let mut lines = input.lines();
        loop {
            self.prompt(out)?;
            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };
            if self.handle_input(&line, out).await? {
                break;
            }
        }
        Ok(())
    }

    fn prompt<W: Write>(&self, out: &mut W) -> Result<(), StudioError> {
        match (&self.pending, self.session.state()) {
            (Some(pending), _) => write!(out, "[retry: {}] > ", pending)?,
            (None, ConversationState::AwaitingRole) => write!(out, "role> ")?,
            (None, ConversationState::RoleActive(role)) => write!(out, "{}> ", role)?,
        }
        out.flush()?;
        Ok(())
    }

    /// Handles one line. Returns `true` when the REPL should exit.
    pub async fn handle_input<W: Write>(&mut self, line: &str, out: &mut W) -> Result<bool, StudioError> {
        match parse_command(line) {
            Command::Empty => {
                if let Some(input) = self.pending.take() {
                    self.submit(&input, out).await?;
                }
            }
            Command::Submit(text) => {
                self.pending = None;
                self.submit(&text, out).await?;
            }
            Command::Upload(path) => match read_image(&path).await {
                Ok(image) => match self.session.upload(image) {
                    Ok(()) => {
                        self.pending = None;
                        writeln!(out, "Loaded {}. Enter a role.", path.display())?;
                    }
                    Err(e) => writeln!(out, "error: {}", e)?,
                },
                Err(e) => writeln!(out, "error: {}", e)?,
            },
            Command::Save(path) => match self.session.current_image() {
                Some(image) => match write_image(&path, &image).await {
                    Ok(written) => writeln!(out, "Saved {}.", written.display())?,
                    Err(e) => writeln!(out, "error: {}", e)?,
                },
                None => writeln!(out, "error: nothing to save yet")?,
            },
            Command::Reset => match self.session.reset() {
                Ok(()) => {
                    self.pending = None;
                    writeln!(out, "Persona cleared. Enter a new role.")?;
                }
                Err(e) => writeln!(out, "error: {}", e)?,
            },
            Command::History => {
                let transcript = self.session.transcript();
                if transcript.is_empty() {
                    writeln!(out, "No conversation yet.")?;
                }
                for turn in transcript {
                    let who = match turn.author {
                        Author::User => "you",
                        Author::Persona => "persona",
                    };
                    writeln!(out, "[{}] {}: {}", turn.at.format("%H:%M:%S"), who, turn.text)?;
                }
            }
            Command::Video => self.video(out).await?,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(true),
            Command::Invalid(message) => writeln!(out, "{}", message)?,
        }
        Ok(false)
    }

    async fn submit<W: Write>(&mut self, input: &str, out: &mut W) -> Result<(), StudioError> {
        writeln!(out, "...")?;
        out.flush()?;

        match self.session.submit(input).await {
            Ok(Outcome::Transformed { role, image }) => {
                writeln!(
                    out,
                    "You are now talking to a {}. New image ready ({}, {} bytes); /save <path> to keep it.",
                    role,
                    image.mime_type,
                    image.decoded_len()
                )?;
            }
            Ok(Outcome::Replied { reply, speech }) => {
                writeln!(out, "{}", reply.response)?;
                match speech {
                    SpeechStatus::Spoken { voice } => {
                        writeln!(out, "  ({}, voice {})", reply.language, voice)?
                    }
                    SpeechStatus::Disabled => writeln!(out, "  ({})", reply.language)?,
                    SpeechStatus::Unavailable(reason) => {
                        writeln!(out, "  ({}, not spoken: {})", reply.language, reason)?
                    }
                }
            }
            Err(failure) => {
                writeln!(out, "error: {}", failure.message)?;
                if !failure.restored_input.trim().is_empty() {
                    writeln!(out, "Press Enter to retry.")?;
                    self.pending = Some(failure.restored_input);
                }
            }
        }
        Ok(())
    }

    async fn video<W: Write>(&self, out: &mut W) -> Result<(), StudioError> {
        let Some(proxy) = &self.proxy else {
            writeln!(out, "error: the avatar proxy is not configured")?;
            return Ok(());
        };
        let ConversationState::RoleActive(role) = self.session.state() else {
            writeln!(out, "error: choose a role first")?;
            return Ok(());
        };
        let Some(text) = self.session.last_reply() else {
            writeln!(out, "error: no reply to render yet")?;
            return Ok(());
        };

        writeln!(out, "Rendering video...")?;
        out.flush()?;
        match render_video(proxy, &text, &role).await {
            Ok(url) => writeln!(out, "Video ready: {}", url)?,
            Err(e) => {
                tracing::warn!(error = %e, "video render failed");
                writeln!(out, "error: {}", e)?;
            }
        }
        Ok(())
    }
}

async fn render_video(proxy: &AvatarProxyClient, text: &str, role: &Role) -> Result<String, ProxyError> {
    let talk = proxy.talk(text, role).await?;
    tracing::info!(id = %talk.id, "video render started");
    proxy.wait_for_video(&talk.id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_submits() {
        assert_eq!(parse_command("  queen "), Command::Submit("queen".to_string()));
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("   \n"), Command::Empty);
    }

    #[test]
    fn parses_commands_with_paths() {
        assert_eq!(
            parse_command("/upload  ~/me.jpg"),
            Command::Upload(PathBuf::from("~/me.jpg"))
        );
        assert_eq!(
            parse_command("/save out dir/avatar.png"),
            Command::Save(PathBuf::from("out dir/avatar.png"))
        );
        assert!(matches!(parse_command("/upload"), Command::Invalid(_)));
    }

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse_command("/reset"), Command::Reset);
        assert_eq!(parse_command("/history"), Command::History);
        assert_eq!(parse_command("/video"), Command::Video);
        assert_eq!(parse_command("/?"), Command::Help);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert!(matches!(parse_command("/dance"), Command::Invalid(m) if m.contains("/dance")));
    }
}
