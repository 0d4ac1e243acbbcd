pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod remote;
pub mod schema;
pub mod store;
pub mod ui;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{DataError, Result};
pub use normalize::{Dataset, Pass, Pipeline};
pub use schema::SchemaSynthesizer;
pub use store::{Collection, Layout, Record, RecordStore};
pub use ui::{ConsoleUi, SilentUi, Ui};
