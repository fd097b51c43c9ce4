//! Command parsing and dispatch for the game world.
//!
//! [`MushProcessor`] turns one line of player input into a [`CommandResponse`].
//! When the player's session carries a pending prompt the line is treated as
//! the answer to that prompt; otherwise it is parsed as a command.

use log::{debug, info};

use crate::config::WorldConfig;
use crate::logutil::escape_log;
use crate::mush::access::{can_perform, get_denied_message, Action, ObjectState};
use crate::mush::building::{create_item, create_room, dig, drop_item, move_player, pick_up};
use crate::mush::errors::MushError;
use crate::mush::grid::{nearby_rooms, render};
use crate::mush::prompt::{is_affirmative, reply_text, PendingPrompt};
use crate::mush::resolver::{
    format_disambiguation, resolve_target, ObjectMatch, ResolveResult, SearchScope, Target,
};
use crate::mush::storage::MushStore;
use crate::mush::types::{
    Attribute, Direction, ExitRecord, ItemRecord, PlayerRecord, RoomRecord,
};
use crate::session::PlayerSession;
use crate::validation::{sanitize_text, validate_object_name};

/// Parsed player commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MushCommand {
    // Navigation
    Look(Option<String>), // LOOK, LOOK lamp
    Move(String),         // N, NORTH, GO N
    Map,                  // MAP

    // Items
    Inventory,    // I, INV
    Get(String),  // GET lamp, GRAB lamp
    Drop(String), // DROP lamp

    // Lore
    Describe(Option<String>),      // DESCRIBE, DESCRIBE lamp
    Sense(Action, Option<String>), // TASTE/TOUCH/SMELL lamp

    // Building
    Explore(Option<String>), // EXPLORE n
    Home,                    // HOME
    SetHome,                 // SETHOME

    // System
    Help,
    Quit,

    Unknown(String),
}

/// Parse raw input into a command. Verbs are case-insensitive; arguments keep their case.
pub fn parse_command(input: &str) -> MushCommand {
    let input = input.trim();
    let (verb, rest) = match input.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (input, ""),
    };
    let arg = if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    };

    match verb.to_ascii_lowercase().as_str() {
        "l" | "look" => MushCommand::Look(arg),
        "go" | "walk" => MushCommand::Move(rest.to_string()),
        "map" => MushCommand::Map,
        "inv" | "inventory" => MushCommand::Inventory,
        "get" | "grab" | "take" => MushCommand::Get(rest.to_string()),
        "drop" => MushCommand::Drop(rest.to_string()),
        "describe" | "desc" => MushCommand::Describe(arg),
        "taste" => MushCommand::Sense(Action::Taste, arg),
        "touch" => MushCommand::Sense(Action::Touch, arg),
        "smell" => MushCommand::Sense(Action::Smell, arg),
        "explore" => MushCommand::Explore(arg),
        "home" => MushCommand::Home,
        "sethome" => MushCommand::SetHome,
        "help" | "h" | "?" => MushCommand::Help,
        "quit" | "q" => MushCommand::Quit,
        // "i" is both a direction and the usual inventory shortcut; inventory wins
        "i" => MushCommand::Inventory,
        _ if exit_choice(input).is_some() => MushCommand::Move(input.to_ascii_lowercase()),
        _ => MushCommand::Unknown(input.to_string()),
    }
}

/// Splits a movement token into its direction and an optional 1-based pick
/// among duplicate exits: "north", "north 2", "north-2" or "2-north".
pub fn exit_choice(token: &str) -> Option<(Direction, Option<usize>)> {
    let token = token.trim();
    if let Some(direction) = Direction::parse(token) {
        return Some((direction, None));
    }
    let (left, right) = token
        .split_once('-')
        .or_else(|| token.split_once(char::is_whitespace))?;
    let (left, right) = (left.trim(), right.trim());
    let (word, pick) = match left.parse::<usize>() {
        Ok(pick) => (right, pick),
        Err(_) => (left, right.parse::<usize>().ok()?),
    };
    if pick == 0 {
        return None;
    }
    Some((Direction::parse(word)?, Some(pick)))
}

/// Text aimed at everyone in a room except one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub room_id: String,
    pub exclude: String,
    pub text: String,
}

/// What a command produced: the caller's reply and any room announcements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResponse {
    pub text: String,
    pub broadcasts: Vec<Broadcast>,
}

impl CommandResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            broadcasts: Vec::new(),
        }
    }

    fn announce(mut self, room_id: &str, actor: &PlayerRecord, text: String) -> Self {
        self.broadcasts.push(Broadcast {
            room_id: room_id.to_string(),
            exclude: actor.username.clone(),
            text,
        });
        self
    }
}

/// Command processor bound to one world store.
pub struct MushProcessor {
    store: MushStore,
    world: WorldConfig,
}

impl MushProcessor {
    pub fn new(store: MushStore, world: WorldConfig) -> Self {
        Self { store, world }
    }

    pub fn store(&self) -> &MushStore {
        &self.store
    }

    pub fn world(&self) -> &WorldConfig {
        &self.world
    }

    /// Load the session's player, creating it in the start room on first visit.
    pub fn load_player(&self, session: &PlayerSession) -> Result<PlayerRecord, MushError> {
        let mut player = match self.store.get_player(&session.username) {
            Ok(player) => player,
            Err(MushError::NotFound(_)) => {
                info!("new player {} starting in {}", session.username, self.world.start_room);
                let player = PlayerRecord::new(
                    &session.username,
                    &session.display_name,
                    &self.world.start_room,
                );
                self.store.put_player(player.clone())?;
                return Ok(player);
            }
            Err(e) => return Err(e),
        };

        if !self.store.room_exists(&player.current_room)? {
            info!(
                "player {} was in missing room {}; returning to {}",
                player.username, player.current_room, self.world.start_room
            );
            player.current_room = self.world.start_room.clone();
            self.store.put_player(player.clone())?;
        }
        Ok(player)
    }

    /// Greeting and first look for a session entering the world.
    pub fn enter(&self, session: &PlayerSession, welcome: &str) -> Result<CommandResponse, MushError> {
        let player = self.load_player(session)?;
        let room = self.store.get_room(&player.current_room)?;
        let text = format!("{}\n\n{}", welcome, self.describe_room(&room, &player)?);
        Ok(CommandResponse::text(text).announce(
            &room.id,
            &player,
            format!("{} appears.", player.display_name),
        ))
    }

    /// Process one line of input for `session`.
    pub fn handle_input(
        &self,
        session: &mut PlayerSession,
        input: &str,
    ) -> Result<CommandResponse, MushError> {
        if let Some(prompt) = session.pending.take() {
            debug!(
                "prompt reply: player={} prompt={:?} input={}",
                session.username,
                prompt,
                escape_log(input)
            );
            return self.handle_reply(session, prompt, input);
        }

        let command = parse_command(input);
        debug!(
            "command parsed: player={} command={:?}",
            session.username, command
        );

        match command {
            MushCommand::Look(target) => self.handle_look(session, target),
            MushCommand::Move(token) => self.handle_move(session, &token),
            MushCommand::Map => self.handle_map(session),
            MushCommand::Inventory => self.handle_inventory(session),
            MushCommand::Get(name) => self.handle_get(session, &name),
            MushCommand::Drop(name) => self.handle_drop(session, &name),
            MushCommand::Describe(target) => self.handle_sense(session, Action::Describe, target),
            MushCommand::Sense(action, target) => self.handle_sense(session, action, target),
            MushCommand::Explore(direction) => self.handle_explore(session, direction),
            MushCommand::Home => self.handle_home(session),
            MushCommand::SetHome => self.handle_sethome(session),
            MushCommand::Help => Ok(CommandResponse::text(help_text())),
            MushCommand::Quit => {
                session.quit = true;
                Ok(CommandResponse::text("Goodbye."))
            }
            MushCommand::Unknown(cmd) if cmd.is_empty() => {
                Ok(CommandResponse::text("Type HELP for available commands."))
            }
            MushCommand::Unknown(cmd) => Ok(CommandResponse::text(format!(
                "Unknown command: '{}'\nType HELP for available commands.",
                cmd
            ))),
        }
    }

    fn handle_reply(
        &self,
        session: &mut PlayerSession,
        prompt: PendingPrompt,
        input: &str,
    ) -> Result<CommandResponse, MushError> {
        match prompt {
            PendingPrompt::ExploreRoomName { direction } => {
                self.finish_explore(session, direction, input)
            }
            PendingPrompt::ConfirmCreateItem { name } => self.finish_create_item(session, &name, input),
            PendingPrompt::FlavourText {
                target,
                target_name,
                attribute,
            } => self.finish_sense(session, target, &target_name, attribute, input),
            PendingPrompt::HomeName => self.finish_home_name(session, input),
            PendingPrompt::HomeDescription { name } => self.finish_home(session, &name, input),
        }
    }

    /// Room header, description, exits, items and other players present.
    pub fn describe_room(&self, room: &RoomRecord, viewer: &PlayerRecord) -> Result<String, MushError> {
        let mut text = room.name.clone();
        if let Some(coords) = room.coords {
            text.push_str(&format!(" ({}, {})", coords.x, coords.y));
        }
        text.push('\n');
        if room.description().is_empty() {
            text.push_str("Nobody has described this place yet. Use DESCRIBE to add the first impression.");
        } else {
            text.push_str(room.description());
        }

        if room.exits.is_empty() {
            text.push_str("\nExits: none");
        } else {
            let exits = room.exit_labels();
            text.push_str(&format!("\nExits: {}", exits.join(", ")));
        }

        let items: Vec<String> = room
            .items
            .iter()
            .filter_map(|id| self.store.get_item(id).ok())
            .map(|item| item.name)
            .collect();
        if !items.is_empty() {
            text.push_str(&format!("\nYou see: {}", items.join(", ")));
        }

        let others = self.players_in_room(&room.id, Some(viewer.username.as_str()))?;
        if !others.is_empty() {
            let names: Vec<String> = others.into_iter().map(|p| p.display_name).collect();
            text.push_str(&format!("\nAlso here: {}", names.join(", ")));
        }
        Ok(text)
    }

    /// Players whose current room is `room_id`, optionally skipping one.
    pub fn players_in_room(
        &self,
        room_id: &str,
        skip: Option<&str>,
    ) -> Result<Vec<PlayerRecord>, MushError> {
        let mut players = Vec::new();
        for username in self.store.list_player_ids()? {
            if skip == Some(username.as_str()) {
                continue;
            }
            let player = self.store.get_player(&username)?;
            if player.current_room == room_id {
                players.push(player);
            }
        }
        Ok(players)
    }

    fn describe_item(&self, item: &ItemRecord) -> String {
        let mut text = item.name.clone();
        text.push('\n');
        if item.description().is_empty() {
            text.push_str("You see nothing special.");
        } else {
            text.push_str(item.description());
        }
        for attribute in [Attribute::Taste, Attribute::Touch, Attribute::Smell] {
            if let Some(value) = item.flavour.get(attribute) {
                text.push_str(&format!("\n{}: {}", capitalize(attribute.key()), value));
            }
        }
        text
    }

    fn current(&self, session: &PlayerSession) -> Result<(PlayerRecord, RoomRecord), MushError> {
        let player = self.load_player(session)?;
        let room = self.store.get_room(&player.current_room)?;
        Ok((player, room))
    }

    fn handle_look(
        &self,
        session: &PlayerSession,
        target: Option<String>,
    ) -> Result<CommandResponse, MushError> {
        let (player, room) = self.current(session)?;
        let Some(target) = target else {
            return Ok(CommandResponse::text(self.describe_room(&room, &player)?));
        };

        match resolve_target(&self.store, &player, &room, &target, SearchScope::Nearby)? {
            ResolveResult::Found(ObjectMatch {
                target: Target::Room(_),
                ..
            }) => Ok(CommandResponse::text(self.describe_room(&room, &player)?)),
            ResolveResult::Found(ObjectMatch {
                target: Target::Item(id),
                ..
            }) => {
                let item = self.store.get_item(&id)?;
                Ok(CommandResponse::text(self.describe_item(&item)))
            }
            ResolveResult::Ambiguous(matches) => {
                Ok(CommandResponse::text(format_disambiguation(&target, &matches)))
            }
            ResolveResult::NotFound => {
                if player.is_self_reference(&target) {
                    return Ok(CommandResponse::text(format!(
                        "You are {}. You look like yourself.",
                        player.display_name
                    )));
                }
                Ok(CommandResponse::text(format!("You don't see '{}' here.", target)))
            }
        }
    }

    fn handle_move(&self, session: &PlayerSession, token: &str) -> Result<CommandResponse, MushError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(CommandResponse::text("Go where?"));
        }
        let Some((direction, pick)) = exit_choice(token) else {
            return Ok(CommandResponse::text(format!(
                "You can't go {} from here. Try EXPLORE <direction> to find out what lies that way.",
                token
            )));
        };
        let (mut player, room) = self.current(session)?;
        let exits = room.exits_toward(direction);
        let exit = match (exits.as_slice(), pick) {
            ([], _) => {
                return Ok(CommandResponse::text(format!(
                    "You can't go {} from here. Try EXPLORE {} to find out what lies that way.",
                    direction.name(),
                    direction.abbrev()
                )))
            }
            ([only], None) => *only,
            (several, None) => {
                return Ok(CommandResponse::text(self.exit_choices(direction, several)?))
            }
            (all, Some(pick)) => match all.get(pick - 1) {
                Some(exit) => *exit,
                None if all.len() == 1 => {
                    return Ok(CommandResponse::text(format!(
                        "There is only one exit {} here.",
                        direction.name()
                    )))
                }
                None => {
                    return Ok(CommandResponse::text(format!(
                        "There are only {} exits {} here.",
                        all.len(),
                        direction.name()
                    )))
                }
            },
        };
        let destination = move_player(&self.store, &mut player, &exit.destination)?;
        debug!("player {} moved {} to {}", player.username, direction.name(), destination.id);

        let text = format!(
            "You go {}.\n\n{}",
            direction.name(),
            self.describe_room(&destination, &player)?
        );
        Ok(CommandResponse::text(text)
            .announce(&room.id, &player, format!("{} leaves {}.", player.display_name, direction.name()))
            .announce(&destination.id, &player, format!("{} arrives.", player.display_name)))
    }

    /// Numbered list of the rooms reached by several exits sharing a direction.
    fn exit_choices(&self, direction: Direction, exits: &[&ExitRecord]) -> Result<String, MushError> {
        let mut text = format!("Which way {}?", direction.name());
        for (index, exit) in exits.iter().enumerate() {
            let room = self.store.get_room(&exit.destination)?;
            text.push_str(&format!("\n  {}. {} to {}", index + 1, direction.name(), room.name));
        }
        text.push_str(&format!(
            "\nType '{name} 2' or '2-{name}' to choose.",
            name = direction.name()
        ));
        Ok(text)
    }

    fn handle_map(&self, session: &PlayerSession) -> Result<CommandResponse, MushError> {
        let (_player, room) = self.current(session)?;
        let Some(coords) = room.coords else {
            return Ok(CommandResponse::text(format!(
                "{} isn't on the map. Rooms reached by up, down, in or out have no place on the grid.",
                room.name
            )));
        };
        let grid = nearby_rooms(
            &self.store,
            coords.x,
            coords.y,
            self.world.effective_map_radius(),
        )?;
        Ok(CommandResponse::text(format!(
            "Map around {} ({}, {}):\n{}\n # you  ■ room  · unexplored",
            room.name,
            coords.x,
            coords.y,
            render(&grid)
        )))
    }

    fn handle_inventory(&self, session: &PlayerSession) -> Result<CommandResponse, MushError> {
        let player = self.load_player(session)?;
        if player.inventory.is_empty() {
            return Ok(CommandResponse::text("You are carrying nothing."));
        }
        let mut text = "You are carrying:".to_string();
        for item_id in &player.inventory {
            match self.store.get_item(item_id) {
                Ok(item) => text.push_str(&format!("\n  {}", item.name)),
                Err(MushError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(CommandResponse::text(text))
    }

    fn handle_get(&self, session: &mut PlayerSession, name: &str) -> Result<CommandResponse, MushError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(CommandResponse::text("Usage: get <object>"));
        }
        let (mut player, room) = self.current(session)?;
        if player.is_self_reference(name) {
            return Ok(CommandResponse::text("You can't get yourself."));
        }

        match resolve_target(&self.store, &player, &room, name, SearchScope::RoomItems)? {
            ResolveResult::Found(ObjectMatch {
                target: Target::Item(id),
                ..
            }) => {
                let item = self.store.get_item(&id)?;
                let state = ObjectState::Item(&item);
                if !can_perform(state, Action::Get) {
                    debug!("{} may not take {}", player.username, escape_log(state.name()));
                    return Ok(CommandResponse::text(get_denied_message(state)));
                }
                let item = pick_up(&self.store, &mut player, &item.id)?;
                Ok(CommandResponse::text(format!("You pick up {}.", item.name)).announce(
                    &room.id,
                    &player,
                    format!("{} picks up {}.", player.display_name, item.name),
                ))
            }
            ResolveResult::Found(ObjectMatch {
                target: Target::Room(_),
                ..
            }) => Ok(CommandResponse::text(get_denied_message(ObjectState::Room(&room)))),
            ResolveResult::Ambiguous(matches) => {
                Ok(CommandResponse::text(format_disambiguation(name, &matches)))
            }
            ResolveResult::NotFound => {
                let carried = resolve_target(&self.store, &player, &room, name, SearchScope::Inventory)?;
                if let ResolveResult::Found(found) = carried {
                    return Ok(CommandResponse::text(format!(
                        "You are already carrying {}.",
                        found.name
                    )));
                }
                if self
                    .players_in_room(&room.id, Some(player.username.as_str()))?
                    .iter()
                    .any(|other| other.is_self_reference(name))
                {
                    return Ok(CommandResponse::text("You can't get that."));
                }
                let name = match validate_object_name(name, self.world.max_name_length) {
                    Ok(name) => name,
                    Err(e) => return Ok(CommandResponse::text(e.to_string())),
                };
                let prompt = PendingPrompt::ConfirmCreateItem { name };
                let question = prompt.question();
                session.pending = Some(prompt);
                Ok(CommandResponse::text(question))
            }
        }
    }

    fn finish_create_item(
        &self,
        session: &mut PlayerSession,
        name: &str,
        input: &str,
    ) -> Result<CommandResponse, MushError> {
        if !is_affirmative(input) {
            return Ok(CommandResponse::text(format!("You leave the idea of {} behind.", name)));
        }
        let (mut player, room) = self.current(session)?;
        let item = create_item(&self.store, name, &room.id, &player.username)?;
        let item = pick_up(&self.store, &mut player, &item.id)?;
        Ok(
            CommandResponse::text(format!("You create {} and pick it up.", item.name)).announce(
                &room.id,
                &player,
                format!("{} picks up {}.", player.display_name, item.name),
            ),
        )
    }

    fn handle_drop(&self, session: &PlayerSession, name: &str) -> Result<CommandResponse, MushError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(CommandResponse::text("Usage: drop <object>"));
        }
        let (mut player, room) = self.current(session)?;
        match resolve_target(&self.store, &player, &room, name, SearchScope::Inventory)? {
            ResolveResult::Found(ObjectMatch {
                target: Target::Item(id),
                ..
            }) => {
                let item = drop_item(&self.store, &mut player, &id)?;
                Ok(CommandResponse::text(format!("You drop {}.", item.name)).announce(
                    &room.id,
                    &player,
                    format!("{} drops {}.", player.display_name, item.name),
                ))
            }
            ResolveResult::Ambiguous(matches) => {
                Ok(CommandResponse::text(format_disambiguation(name, &matches)))
            }
            _ => Ok(CommandResponse::text(format!("You aren't carrying '{}'.", name))),
        }
    }

    fn handle_sense(
        &self,
        session: &mut PlayerSession,
        action: Action,
        target: Option<String>,
    ) -> Result<CommandResponse, MushError> {
        let Some(attribute) = action.attribute() else {
            return Err(MushError::Internal(format!("{} has no attribute", action.verb())));
        };
        let (player, room) = self.current(session)?;

        let found = match target {
            // DESCRIBE alone describes the room you stand in
            None if action == Action::Describe => ObjectMatch {
                target: Target::Room(room.id.clone()),
                name: room.name.clone(),
                location: "here",
            },
            None => {
                return Ok(CommandResponse::text(format!("Usage: {} <object>", action.verb())));
            }
            Some(query) => {
                match resolve_target(&self.store, &player, &room, &query, SearchScope::Nearby)? {
                    ResolveResult::Found(found) => found,
                    ResolveResult::Ambiguous(matches) => {
                        return Ok(CommandResponse::text(format_disambiguation(&query, &matches)));
                    }
                    ResolveResult::NotFound => {
                        return Ok(CommandResponse::text(format!(
                            "You don't see '{}' here.",
                            query
                        )));
                    }
                }
            }
        };

        let inspect = |state: ObjectState<'_>| {
            (
                can_perform(state, action),
                state.flavour().get(attribute).map(str::to_string),
                state.name().to_string(),
            )
        };
        let (allowed, existing, name) = match &found.target {
            Target::Room(id) => inspect(ObjectState::Room(&self.store.get_room(id)?)),
            Target::Item(id) => inspect(ObjectState::Item(&self.store.get_item(id)?)),
        };

        if !allowed {
            let value = existing.unwrap_or_default();
            return Ok(CommandResponse::text(attribute.display(&name, &value)));
        }

        let prompt = PendingPrompt::FlavourText {
            target: found.target,
            target_name: name,
            attribute,
        };
        let question = prompt.question();
        session.pending = Some(prompt);
        Ok(CommandResponse::text(question))
    }

    fn finish_sense(
        &self,
        session: &PlayerSession,
        target: Target,
        target_name: &str,
        attribute: Attribute,
        input: &str,
    ) -> Result<CommandResponse, MushError> {
        let Some(text) = reply_text(input) else {
            return Ok(CommandResponse::text("Nothing changed."));
        };
        let text = match sanitize_text(text, self.world.max_text_length) {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => return Ok(CommandResponse::text("Nothing changed.")),
            Err(e) => return Ok(CommandResponse::text(e.to_string())),
        };

        let written = match &target {
            Target::Room(id) => self
                .store
                .set_room_flavour_once(id, attribute, &text)
                .map(|_| ()),
            Target::Item(id) => self
                .store
                .set_item_flavour_once(id, attribute, &text)
                .map(|_| ()),
        };

        match written {
            Ok(()) => {
                info!(
                    "{} set {} on {}: {}",
                    session.username,
                    attribute.key(),
                    escape_log(target_name),
                    escape_log(&text)
                );
                self.store.append_log(&format!(
                    "{} {} '{}' by {}",
                    attribute.key(),
                    target_id(&target),
                    target_name,
                    session.username
                ))?;
                Ok(CommandResponse::text(match attribute {
                    Attribute::Desc => format!("You describe {}.", target_name),
                    Attribute::Taste => format!("You note how {} tastes.", target_name),
                    Attribute::Touch => format!("You note how {} feels.", target_name),
                    Attribute::Smell => format!("You note how {} smells.", target_name),
                }))
            }
            Err(MushError::AttributeAlreadySet { .. }) => {
                let current = match &target {
                    Target::Room(id) => self.store.get_room(id)?.flavour,
                    Target::Item(id) => self.store.get_item(id)?.flavour,
                };
                let value = current.get(attribute).unwrap_or_default().to_string();
                Ok(CommandResponse::text(format!(
                    "Someone got there first.\n{}",
                    attribute.display(target_name, &value)
                )))
            }
            Err(e) => Err(e),
        }
    }

    fn handle_explore(
        &self,
        session: &mut PlayerSession,
        direction: Option<String>,
    ) -> Result<CommandResponse, MushError> {
        let Some(token) = direction else {
            return Ok(CommandResponse::text(format!(
                "Usage: explore <direction>\nValid directions: {}",
                Direction::valid_list()
            )));
        };
        let token = token.split_whitespace().next().unwrap_or_default();
        let Some(direction) = Direction::parse(token) else {
            return Ok(CommandResponse::text(format!(
                "'{}' is not a direction you can explore.\nValid directions: {}",
                token,
                Direction::valid_list()
            )));
        };

        let (_player, room) = self.current(session)?;
        if let Some(refusal) = self.duplicate_exit_refusal(&room, direction) {
            return Ok(CommandResponse::text(refusal));
        }

        let prompt = PendingPrompt::ExploreRoomName { direction };
        let text = format!(
            "You move {} from {} into a new area.\n{}",
            direction.name(),
            room.name,
            prompt.question()
        );
        session.pending = Some(prompt);
        Ok(CommandResponse::text(text))
    }

    fn duplicate_exit_refusal(&self, room: &RoomRecord, direction: Direction) -> Option<String> {
        if self.world.allow_duplicate_exits || !room.has_exit(direction) {
            return None;
        }
        Some(format!(
            "There is already an exit {} from here. Walk it instead.",
            direction.name()
        ))
    }

    fn finish_explore(
        &self,
        session: &mut PlayerSession,
        direction: Direction,
        input: &str,
    ) -> Result<CommandResponse, MushError> {
        let prompt = PendingPrompt::ExploreRoomName { direction };
        let Some(name) = reply_text(input) else {
            let again = prompt.reprompt().unwrap_or_else(|| prompt.question());
            session.pending = Some(prompt);
            return Ok(CommandResponse::text(again));
        };
        let name = match validate_object_name(name, self.world.max_name_length) {
            Ok(name) => name,
            Err(e) => {
                let text = format!("{}\n{}", e, prompt.question());
                session.pending = Some(prompt);
                return Ok(CommandResponse::text(text));
            }
        };

        let (mut player, origin) = self.current(session)?;
        if let Some(refusal) = self.duplicate_exit_refusal(&origin, direction) {
            return Ok(CommandResponse::text(refusal));
        }

        let outcome = dig(&self.store, &mut player, direction, &name)?;
        info!(
            "{} explored {} from {} into {} ({})",
            player.username,
            direction.name(),
            origin.id,
            outcome.room.id,
            escape_log(&outcome.room.name)
        );

        let placement = match outcome.room.coords {
            Some(coords) => format!("{} added to map at ({}, {}).", outcome.room.name, coords.x, coords.y),
            None => format!("{} lies off the map grid.", outcome.room.name),
        };
        let text = format!(
            "{}\n\n{}",
            placement,
            self.describe_room(&outcome.room, &player)?
        );
        Ok(CommandResponse::text(text).announce(
            &origin.id,
            &player,
            format!(
                "{} heads {} into a new area.",
                player.display_name,
                direction.name()
            ),
        ))
    }

    fn has_real_home(&self, player: &PlayerRecord) -> Result<bool, MushError> {
        match &player.home {
            Some(home) if *home != self.world.start_room => self.store.room_exists(home),
            _ => Ok(false),
        }
    }

    fn handle_home(&self, session: &mut PlayerSession) -> Result<CommandResponse, MushError> {
        let (mut player, room) = self.current(session)?;
        if !self.has_real_home(&player)? {
            let prompt = PendingPrompt::HomeName;
            let question = prompt.question();
            session.pending = Some(prompt);
            return Ok(CommandResponse::text(question));
        }
        let Some(home_id) = player.home.clone() else {
            return Err(MushError::Internal("home vanished mid-command".to_string()));
        };
        if home_id == room.id {
            return Ok(CommandResponse::text("You are already home!"));
        }

        let home = move_player(&self.store, &mut player, &home_id)?;
        let text = format!(
            "There's no place like home ...\n\n{}",
            self.describe_room(&home, &player)?
        );
        Ok(CommandResponse::text(text)
            .announce(&room.id, &player, format!("{} heads home.", player.display_name))
            .announce(&home.id, &player, format!("{} arrives home.", player.display_name)))
    }

    fn finish_home_name(
        &self,
        session: &mut PlayerSession,
        input: &str,
    ) -> Result<CommandResponse, MushError> {
        let prompt = PendingPrompt::HomeName;
        let Some(name) = reply_text(input) else {
            let again = prompt.reprompt().unwrap_or_else(|| prompt.question());
            session.pending = Some(prompt);
            return Ok(CommandResponse::text(again));
        };
        match validate_object_name(name, self.world.max_name_length) {
            Ok(name) => {
                let next = PendingPrompt::HomeDescription { name };
                let question = next.question();
                session.pending = Some(next);
                Ok(CommandResponse::text(question))
            }
            Err(e) => {
                session.pending = Some(prompt);
                Ok(CommandResponse::text(e.to_string()))
            }
        }
    }

    fn finish_home(
        &self,
        session: &mut PlayerSession,
        name: &str,
        input: &str,
    ) -> Result<CommandResponse, MushError> {
        let description = match reply_text(input) {
            Some(text) => match sanitize_text(text, self.world.max_text_length) {
                Ok(text) => Some(text),
                Err(e) => {
                    let prompt = PendingPrompt::HomeDescription {
                        name: name.to_string(),
                    };
                    let question = prompt.question();
                    session.pending = Some(prompt);
                    return Ok(CommandResponse::text(format!("{}\n{}", e, question)));
                }
            },
            None => None,
        };

        let (mut player, origin) = self.current(session)?;
        let home = create_room(&self.store, name, description.as_deref(), &player.username)?;
        player.home = Some(home.id.clone());
        let home = move_player(&self.store, &mut player, &home.id)?;
        info!("{} built a home {} ({})", player.username, home.id, escape_log(&home.name));

        let text = format!(
            "Welcome home to {}.\n\n{}",
            home.name,
            self.describe_room(&home, &player)?
        );
        Ok(CommandResponse::text(text).announce(
            &origin.id,
            &player,
            format!("{} heads off to a new home.", player.display_name),
        ))
    }

    fn handle_sethome(&self, session: &PlayerSession) -> Result<CommandResponse, MushError> {
        let (mut player, room) = self.current(session)?;
        player.home = Some(room.id.clone());
        self.store.put_player(player)?;
        Ok(CommandResponse::text(format!("Your home is now {}.", room.name)))
    }
}

fn target_id(target: &Target) -> &str {
    match target {
        Target::Room(id) | Target::Item(id) => id,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn help_text() -> String {
    [
        "Commands:",
        "  look [thing]          - look around, or at something",
        "  <direction> / go <d>  - walk through an exit (n, ne, e, se, s, sw, w, nw, u, d, in, o)",
        "  <direction> 2 / 2-<d> - take the second of several exits the same way",
        "  explore <direction>   - dig a new room that way and name it",
        "  map                   - show the rooms around you",
        "  get <thing> / grab    - pick something up (or create it)",
        "  drop <thing>          - put something down",
        "  inventory / i         - list what you carry",
        "  describe [thing]      - describe this place or a thing, once",
        "  taste|touch|smell <thing> - record how a thing tastes, feels or smells, once",
        "  home                  - go home, or build one",
        "  sethome               - make this place your home",
        "  quit                  - leave",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbs_case_insensitively_and_keeps_argument_case() {
        assert_eq!(parse_command("GET Red Apple"), MushCommand::Get("Red Apple".into()));
        assert_eq!(parse_command("grab lamp"), MushCommand::Get("lamp".into()));
        assert_eq!(parse_command("Look"), MushCommand::Look(None));
        assert_eq!(parse_command("describe"), MushCommand::Describe(None));
        assert_eq!(
            parse_command("smell  the  rose "),
            MushCommand::Sense(Action::Smell, Some("the  rose".into()))
        );
        assert_eq!(parse_command("explore ne"), MushCommand::Explore(Some("ne".into())));
        assert_eq!(parse_command("explore"), MushCommand::Explore(None));
    }

    #[test]
    fn bare_directions_are_movement() {
        assert_eq!(parse_command("n"), MushCommand::Move("n".into()));
        assert_eq!(parse_command("Southwest"), MushCommand::Move("southwest".into()));
        assert_eq!(parse_command("go up"), MushCommand::Move("up".into()));
        assert_eq!(parse_command("i"), MushCommand::Inventory);
        assert_eq!(parse_command("in"), MushCommand::Move("in".into()));
    }

    #[test]
    fn numbered_exit_picks_are_movement() {
        assert_eq!(parse_command("North 2"), MushCommand::Move("north 2".into()));
        assert_eq!(parse_command("2-n"), MushCommand::Move("2-n".into()));
        assert_eq!(parse_command("go north-2"), MushCommand::Move("north-2".into()));

        assert_eq!(exit_choice("north"), Some((Direction::North, None)));
        assert_eq!(exit_choice("n 2"), Some((Direction::North, Some(2))));
        assert_eq!(exit_choice("north-3"), Some((Direction::North, Some(3))));
        assert_eq!(exit_choice("2-se"), Some((Direction::Southeast, Some(2))));
        assert_eq!(exit_choice("north 0"), None);
        assert_eq!(exit_choice("north now"), None);
        assert_eq!(exit_choice("2-sideways"), None);
    }

    #[test]
    fn unknown_and_empty_input() {
        assert_eq!(parse_command("dance wildly"), MushCommand::Unknown("dance wildly".into()));
        assert_eq!(parse_command("   "), MushCommand::Unknown(String::new()));
        assert_eq!(parse_command("north now"), MushCommand::Unknown("north now".into()));
    }

    #[test]
    fn help_mentions_every_custom_command() {
        let help = help_text();
        assert!(help.contains("2-<d>"));
        for word in ["explore", "map", "get", "describe", "taste", "home", "sethome"] {
            assert!(help.contains(word), "{}", word);
        }
    }

    #[test]
    fn capitalize_words() {
        assert_eq!(capitalize("taste"), "Taste");
        assert_eq!(capitalize(""), "");
    }
}
