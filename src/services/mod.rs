//! Page services: one view model per screen plus the session gate.
//!
//! ARCHITECTURE
//! ============
//! Each page is a view model that owns its transient state (rows, loading
//! flags, inline error) and a `ViewScope`. Operations mutate the view in
//! place against the remote store and never return errors: failures become
//! an `ErrorNotice` and a log line. Route handlers stay focused on HTTP
//! translation and cookie plumbing.

pub mod account;
pub mod dashboard;
pub mod editor;
pub mod feed;
pub mod gate;
pub mod nav;
pub mod posts;
pub mod profiles;
pub mod view;
pub mod viewer;
