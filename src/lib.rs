// Library root
// ------------
// Client core of the dummy-records console. The binary (`main.rs`) wires
// these modules to the interactive terminal menus in `ui`.
//
// Module responsibilities:
// - `api`: shared HTTP plumbing, bearer gating, auth endpoints.
// - `credential_store`: token persistence across runs.
// - `session`: the `Session` value and login/register/logout.
// - `records`: CRUD on the `/dummy` collection.
// - `files`: list/upload/download/delete on both storage targets.
// - `draft`: form state while a record is being edited.
// - `reconciler`: re-lists after every write and exposes `ViewState`.
// - `ui`: terminal presentation on top of `reconciler::Console`.
pub mod api;
pub mod config;
pub mod credential_store;
pub mod draft;
pub mod error;
pub mod files;
pub mod reconciler;
pub mod records;
pub mod session;
pub mod types;
pub mod ui;

pub use config::ConsoleConfig;
pub use error::{ConsoleError, ConsoleResult};
pub use files::StorageTarget;
pub use reconciler::{Console, ViewState};
pub use session::Session;
