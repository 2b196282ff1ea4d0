//! Headless runtime for the medication and vital-sign dashboard.
//!
//! Fetches collections from the REST API, follows the push channels and keeps
//! every dashboard surface current through a [`vitals_ui::Surface`].

pub mod api;
pub mod config;
pub mod controller;
pub mod live;
pub mod logging;
pub mod output;
pub mod view;

pub use api::{FetchError, HttpSource, RecordSource, Resource};
pub use controller::{run, Command, Dashboard, DashboardState};
pub use live::{ChannelEvent, ChannelState, LiveChannel, LiveUpdate, Topic};
pub use output::DirectorySurface;
pub use view::View;
