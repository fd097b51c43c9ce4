use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;

use crate::logutil::escape_log;
use crate::mush::{Broadcast, CommandResponse, MushError, MushProcessor, PendingPrompt};
use crate::validation::{validate_player_name, NameError, PlayerNameRules};

/// # Player Session
///
/// One connected player. The session is the only place interactive state
/// lives between lines of input: a command that needs a follow-up answer
/// parks a [`PendingPrompt`] here and the next line goes to it.
///
/// Messages caused by other players (arrivals, pickups) queue in `outbox`
/// until the front end drains them.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    /// Lowercased username; the key of the player's record.
    pub username: String,
    pub display_name: String,
    pub pending: Option<PendingPrompt>,
    pub outbox: Vec<String>,
    pub quit: bool,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl PlayerSession {
    pub fn new(display_name: &str) -> Self {
        let now = Utc::now();
        PlayerSession {
            username: display_name.to_ascii_lowercase(),
            display_name: display_name.to_string(),
            pending: None,
            outbox: Vec::new(),
            quit: false,
            login_time: now,
            last_activity: now,
        }
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// `"? "` while a prompt waits for an answer, `"> "` otherwise.
    pub fn build_prompt(&self) -> &'static str {
        if self.pending.is_some() {
            "? "
        } else {
            "> "
        }
    }
}

/// Reasons a player cannot join.
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("{0}")]
    InvalidName(#[from] NameError),
    #[error("{0} is already playing.")]
    AlreadyConnected(String),
    #[error(transparent)]
    World(#[from] MushError),
}

/// Owns every connected session and routes input through the processor,
/// delivering room broadcasts to the other sessions standing in that room.
pub struct SessionHub {
    processor: MushProcessor,
    sessions: HashMap<String, PlayerSession>,
    welcome_message: String,
    name_rules: PlayerNameRules,
}

impl SessionHub {
    pub fn new(processor: MushProcessor, welcome_message: impl Into<String>) -> Self {
        SessionHub {
            processor,
            sessions: HashMap::new(),
            welcome_message: welcome_message.into(),
            name_rules: PlayerNameRules::default(),
        }
    }

    pub fn processor(&self) -> &MushProcessor {
        &self.processor
    }

    pub fn session(&self, username: &str) -> Option<&PlayerSession> {
        self.sessions.get(&username.to_ascii_lowercase())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Join as `name`, returning the greeting. Returns the lowercased username
    /// used as the session key alongside the text.
    pub fn connect(&mut self, name: &str) -> Result<(String, String), JoinError> {
        let name = validate_player_name(name, &self.name_rules)?;
        let session = PlayerSession::new(&name);
        if self.sessions.contains_key(&session.username) {
            return Err(JoinError::AlreadyConnected(name));
        }

        let response = self.processor.enter(&session, &self.welcome_message)?;
        let username = session.username.clone();
        info!("session opened for {}", username);
        self.sessions.insert(username.clone(), session);
        self.deliver(&response.broadcasts)?;
        Ok((username, response.text))
    }

    /// Route one line from `username`. Failures inside the world are logged
    /// and reported to the player as a short apology.
    pub fn handle_input(&mut self, username: &str, input: &str) -> String {
        let Some(mut session) = self.sessions.remove(username) else {
            return "You are not connected.".to_string();
        };
        session.update_activity();
        debug!("session {} input: {}", username, escape_log(input));

        let outcome = self.processor.handle_input(&mut session, input);
        let quit = session.quit;
        self.sessions.insert(username.to_string(), session);

        let text = match outcome {
            Ok(CommandResponse { text, broadcasts }) => match self.deliver(&broadcasts) {
                Ok(()) => text,
                Err(e) => {
                    warn!("broadcast from {} failed: {}", username, e);
                    text
                }
            },
            Err(e) => {
                warn!("command from {} failed: {}", username, e);
                "Something went wrong. Please try again.".to_string()
            }
        };

        if quit {
            self.disconnect(username);
        }
        text
    }

    /// Drop a session. Any unanswered prompt is discarded with it.
    pub fn disconnect(&mut self, username: &str) -> Option<PlayerSession> {
        let session = self.sessions.remove(username)?;
        info!(
            "session closed for {} after {}s",
            username,
            (session.last_activity - session.login_time).num_seconds()
        );
        Some(session)
    }

    /// Take the messages queued for `username` by other players.
    pub fn drain_outbox(&mut self, username: &str) -> Vec<String> {
        self.sessions
            .get_mut(username)
            .map(|session| std::mem::take(&mut session.outbox))
            .unwrap_or_default()
    }

    fn deliver(&mut self, broadcasts: &[Broadcast]) -> Result<(), MushError> {
        if broadcasts.is_empty() {
            return Ok(());
        }
        let store = self.processor.store();
        let mut locations = HashMap::new();
        for username in self.sessions.keys() {
            match store.get_player(username) {
                Ok(player) => {
                    locations.insert(username.clone(), player.current_room);
                }
                Err(MushError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        for broadcast in broadcasts {
            for (username, session) in self.sessions.iter_mut() {
                if *username == broadcast.exclude {
                    continue;
                }
                if locations.get(username) == Some(&broadcast.room_id) {
                    session.outbox.push(broadcast.text.clone());
                }
            }
        }
        Ok(())
    }
}
