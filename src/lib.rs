//! Listening statistics, creator revenue and recommendations for a simulated
//! music platform.
//!
//! Core modules:
//! - [`counter`] - Ranked counters with canonical ordering
//! - [`stats`] - Turning plays into counter updates
//! - [`revenue`] - Subscription, ad and merchandise revenue
//! - [`ranking`] - Artist ranking and the end-of-run report
//! - [`recommend`] - Song and playlist recommendations
//! - [`history`] - Page model and back/forward navigation
//! - [`notify`] - Creator subscriptions and listener mailboxes
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - Songs, albums, podcasts, playlists and creator extras
//! - [`profile`] - Listener, artist and host state
//! - [`playback`] - The "now playing" context
//! - [`platform`] - The application context tying everything together
//! - [`scenario`] - JSON command stream driver
//! - [`config`] - Simulation configuration
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use encore::config::SimulationConfig;
//! use encore::catalog::Song;
//! use encore::platform::Platform;
//! use encore::playback::SourceType;
//! use encore::profile::UserKind;
//!
//! let mut platform = Platform::new(SimulationConfig::default());
//! platform.add_user("ana", UserKind::User);
//! platform.add_user("band", UserKind::Artist);
//! platform.add_album("band", "Debut", vec![Song {
//!     name: "Opener".into(),
//!     album: String::new(),
//!     artist: String::new(),
//!     genre: "rock".into(),
//!     duration: 180,
//! }]);
//!
//! platform.buy_premium("ana");
//! platform.load("ana", SourceType::Album, "Debut")?;
//! platform.advance_to(200)?;
//!
//! let report = platform.end_program();
//! assert_eq!(report[0].name, "band");
//! assert_eq!(report[0].song_revenue, 1_000_000.0);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Determinism
//!
//! A run is a pure function of its command stream and configuration. Ranked
//! projections break count ties by key, and random song recommendations are
//! seeded from the playback position, so replaying a scenario reproduces its
//! output exactly.
//!
//! ## Error Handling
//!
//! All fallible public functions return `anyhow::Result`. User mistakes
//! (unknown names, wrong page, nothing playing) are not errors: they come
//! back as messages. Errors are reserved for broken invariants such as a
//! timestamp going backwards.

pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod counter;
pub mod history;
pub mod notify;
pub mod platform;
pub mod playback;
pub mod profile;
pub mod ranking;
pub mod recommend;
pub mod revenue;
pub mod scenario;
pub mod stats;
