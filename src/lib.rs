//! This crate provides the core of a personal task board.
//!
//! The tasks of the signed-in identity live in a remote document store, and are kept in sync by the [`TaskStore`](store::TaskStore). \
//! The board can also display read-only data (calendar events, external tasks, recent mail) from Google APIs, fetched by the [`GoogleClient`](client::GoogleClient)
//! and tracked by an [`IntegrationPanel`](integration::IntegrationPanel).
//!
//! Local tasks and external items are merged into the three board columns by [`fuse`](fusion::fuse). \
//! A [`Dashboard`] ties all of this together, for at most one signed-in identity at a time.
//!
//! The remote collaborators are abstracted by the traits of the [`traits`] module. This crate provides in-process implementations
//! of them ([`MemoryStore`](memory_store::MemoryStore), [`DevIdentityProvider`](identity::DevIdentityProvider)), that can be tweaked to fail with a [`MockBehaviour`](mock_behaviour::MockBehaviour).

pub mod traits;
pub mod error;
pub mod config;

pub mod identity;
pub mod session;
pub mod storage;

pub mod task;
pub use task::Task;
pub mod external;
pub mod item;
pub use item::FusedTask;
pub mod store;
pub mod memory_store;

pub mod client;
pub mod integration;

pub mod fusion;
pub mod dashboard;
pub use dashboard::Dashboard;

pub mod mock_behaviour;
pub mod mock_source;
pub mod utils;
