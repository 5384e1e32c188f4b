//! triagectl - client for the error triage dashboard
//!
//! `Dashboard` is the controller. `Transport` and `BuildExecutor` are the
//! two seams to the server; both have fakes for tests.

pub mod builds;
pub mod commands;
pub mod dashboard;
pub mod executor;
pub mod logging;
pub mod output;
pub mod repl;
pub mod store;
pub mod transport;

pub use dashboard::{Dashboard, SearchOutcome};
pub use executor::{BuildExecutor, FakeBuildExecutor, HttpBuildExecutor};
pub use store::{FetchOutcome, StoreSnapshot};
pub use transport::{FakeTransport, HttpTransport, Transport};
