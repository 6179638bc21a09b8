// Library root
// -----------
// The binary (`main.rs`) only parses top-level flags and sets up logging;
// everything else lives here so it can be tested without a process.
//
// Module responsibilities:
// - `api`: blocking REST client for the reminders backend.
// - `cli`: command table, per-command flags and dispatch.
// - `ui`: response rendering and the in-flight spinner.
pub mod api;
pub mod cli;
pub mod ui;
