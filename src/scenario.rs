//! JSON command stream driver.
//!
//! A scenario is a JSON array of commands, each with a `command` name, the
//! acting `username` and a `timestamp`:
//!
//! ```json
//! [
//!   {"command": "addUser", "username": "ana", "timestamp": 0, "type": "user"},
//!   {"command": "load", "username": "ana", "timestamp": 5, "type": "album", "name": "LP"},
//!   {"command": "wrapped", "username": "ana", "timestamp": 300}
//! ]
//! ```
//!
//! Every command yields one [`Response`]. The run always ends with the
//! `endProgram` report, appended if the scenario does not ask for it.

use crate::catalog::{Announcement, Episode, Event, Song};
use crate::config::SimulationConfig;
use crate::notify::Notification;
use crate::platform::{Platform, Rejection};
use crate::playback::SourceType;
use crate::profile::UserKind;
use crate::ranking::ArtistReport;
use crate::recommend::RecommendationType;
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// One entry of a scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandInput {
    #[serde(default)]
    pub username: Option<String>,
    pub timestamp: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Action {
    AddUser {
        #[serde(rename = "type")]
        kind: UserKind,
    },
    AddAlbum {
        name: String,
        songs: Vec<Song>,
    },
    AddPodcast {
        name: String,
        episodes: Vec<Episode>,
    },
    AddEvent {
        name: String,
        #[serde(default)]
        description: String,
        date: String,
    },
    AddMerch {
        name: String,
        #[serde(default)]
        description: String,
        price: i64,
    },
    AddAnnouncement {
        name: String,
        #[serde(default)]
        description: String,
    },
    Load {
        #[serde(rename = "type")]
        source: String,
        name: String,
    },
    Next,
    Like,
    #[serde(rename_all = "camelCase")]
    CreatePlaylist {
        playlist_name: String,
    },
    #[serde(rename_all = "camelCase")]
    AddRemoveInPlaylist {
        playlist_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Follow {
        owner: String,
        playlist_name: String,
    },
    BuyPremium,
    CancelPremium,
    AdBreak {
        price: u32,
    },
    BuyMerch {
        name: String,
    },
    SeeMerch,
    #[serde(rename_all = "camelCase")]
    ChangePage {
        next_page: String,
    },
    PreviousPage,
    NextPage,
    Subscribe,
    GetNotifications,
    #[serde(rename_all = "camelCase")]
    UpdateRecommendations {
        recommendation_type: String,
    },
    LoadRecommendations,
    Wrapped,
    EndProgram,
}

impl Action {
    /// The `command` name as written in scenario files.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddUser { .. } => "addUser",
            Action::AddAlbum { .. } => "addAlbum",
            Action::AddPodcast { .. } => "addPodcast",
            Action::AddEvent { .. } => "addEvent",
            Action::AddMerch { .. } => "addMerch",
            Action::AddAnnouncement { .. } => "addAnnouncement",
            Action::Load { .. } => "load",
            Action::Next => "next",
            Action::Like => "like",
            Action::CreatePlaylist { .. } => "createPlaylist",
            Action::AddRemoveInPlaylist { .. } => "addRemoveInPlaylist",
            Action::Follow { .. } => "follow",
            Action::BuyPremium => "buyPremium",
            Action::CancelPremium => "cancelPremium",
            Action::AdBreak { .. } => "adBreak",
            Action::BuyMerch { .. } => "buyMerch",
            Action::SeeMerch => "seeMerch",
            Action::ChangePage { .. } => "changePage",
            Action::PreviousPage => "previousPage",
            Action::NextPage => "nextPage",
            Action::Subscribe => "subscribe",
            Action::GetNotifications => "getNotifications",
            Action::UpdateRecommendations { .. } => "updateRecommendations",
            Action::LoadRecommendations => "loadRecommendations",
            Action::Wrapped => "wrapped",
            Action::EndProgram => "endProgram",
        }
    }
}

/// Output of one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<Notification>>,
}

impl Response {
    fn new(input: &CommandInput) -> Self {
        Self {
            command: input.action.name().to_string(),
            user: input.username.clone(),
            timestamp: Some(input.timestamp),
            message: None,
            result: None,
            notifications: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn with_result<T: Serialize>(mut self, outcome: Result<T, Rejection>) -> Result<Self> {
        match outcome {
            Ok(value) => self.result = Some(serde_json::to_value(value)?),
            Err(rejection) => self.message = Some(rejection.0),
        }
        Ok(self)
    }

    fn report(report: &[ArtistReport]) -> Result<Self> {
        let mut result = Map::new();
        for line in report {
            result.insert(line.name.clone(), serde_json::to_value(line)?);
        }
        Ok(Self {
            command: Action::EndProgram.name().to_string(),
            user: None,
            timestamp: None,
            message: None,
            result: Some(Value::Object(result)),
            notifications: None,
        })
    }
}

/// Reads a scenario file.
///
/// # Errors
///
/// Fails if the file cannot be read or does not describe a command list.
pub fn load_scenario(path: &Path) -> Result<Vec<CommandInput>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid scenario {}", path.display()))
}

/// Runs `commands` in order on a fresh platform.
///
/// # Errors
///
/// Fails on the first command that breaks an invariant: a timestamp earlier
/// than the previous one, a missing username, an unknown source or
/// recommendation type.
pub fn run_scenario(commands: Vec<CommandInput>, config: SimulationConfig) -> Result<Vec<Response>> {
    info!("Running scenario of {} commands", commands.len());
    let mut platform = Platform::new(config);
    let mut responses = Vec::with_capacity(commands.len() + 1);
    let mut ended = false;

    for input in &commands {
        platform
            .advance_to(input.timestamp)
            .with_context(|| format!("Command {} at {}", input.action.name(), input.timestamp))?;
        if matches!(input.action, Action::EndProgram) {
            responses.push(Response::report(&platform.end_program())?);
            ended = true;
            break;
        }
        debug!("{} {:?}", input.action.name(), input.username);
        responses.push(execute(&mut platform, input)?);
    }

    if !ended {
        responses.push(Response::report(&platform.end_program())?);
    }
    info!("Scenario produced {} responses", responses.len());
    Ok(responses)
}

fn execute(platform: &mut Platform, input: &CommandInput) -> Result<Response> {
    let user = input
        .username
        .as_deref()
        .ok_or_else(|| anyhow!("Command {} needs a username", input.action.name()))?;
    let response = Response::new(input);

    let response = match &input.action {
        Action::AddUser { kind } => response.with_message(platform.add_user(user, *kind)),
        Action::AddAlbum { name, songs } => {
            response.with_message(platform.add_album(user, name, songs.clone()))
        }
        Action::AddPodcast { name, episodes } => {
            response.with_message(platform.add_podcast(user, name, episodes.clone()))
        }
        Action::AddEvent {
            name,
            description,
            date,
        } => response.with_message(platform.add_event(
            user,
            Event {
                name: name.clone(),
                description: description.clone(),
                date: date.clone(),
            },
        )),
        Action::AddMerch {
            name,
            description,
            price,
        } => response.with_message(platform.add_merch(user, name, description, *price)),
        Action::AddAnnouncement { name, description } => {
            response.with_message(platform.add_announcement(
                user,
                Announcement {
                    name: name.clone(),
                    description: description.clone(),
                },
            ))
        }
        Action::Load { source, name } => {
            let source: SourceType = source.parse()?;
            response.with_message(platform.load(user, source, name)?)
        }
        Action::Next => response.with_message(platform.next_track(user)?),
        Action::Like => response.with_message(platform.like(user)),
        Action::CreatePlaylist { playlist_name } => {
            response.with_message(platform.create_playlist(user, playlist_name))
        }
        Action::AddRemoveInPlaylist { playlist_name } => {
            response.with_message(platform.add_remove_in_playlist(user, playlist_name))
        }
        Action::Follow {
            owner,
            playlist_name,
        } => response.with_message(platform.follow(user, owner, playlist_name)),
        Action::BuyPremium => response.with_message(platform.buy_premium(user)),
        Action::CancelPremium => response.with_message(platform.cancel_premium(user)),
        Action::AdBreak { price } => response.with_message(platform.ad_break(user, *price)),
        Action::BuyMerch { name } => response.with_message(platform.buy_merch(user, name)),
        Action::SeeMerch => response.with_result(platform.see_merch(user))?,
        Action::ChangePage { next_page } => {
            response.with_message(platform.change_page(user, next_page))
        }
        Action::PreviousPage => response.with_message(platform.previous_page(user)),
        Action::NextPage => response.with_message(platform.next_page(user)),
        Action::Subscribe => response.with_message(platform.subscribe(user)),
        Action::GetNotifications => match platform.notifications(user) {
            Ok(notifications) => Response {
                notifications: Some(notifications),
                ..response
            },
            Err(rejection) => response.with_message(rejection.0),
        },
        Action::UpdateRecommendations {
            recommendation_type,
        } => {
            let kind: RecommendationType = recommendation_type.parse()?;
            response.with_message(platform.update_recommendations(user, kind))
        }
        Action::LoadRecommendations => {
            response.with_message(platform.load_recommendations(user)?)
        }
        Action::Wrapped => response.with_result(platform.wrapped(user))?,
        Action::EndProgram => Response::report(&platform.end_program())?,
    };
    Ok(response)
}
