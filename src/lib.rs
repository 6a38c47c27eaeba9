//! # record-manager
//!
//! Terminal record manager for a remote REST collection of person records
//! (name, age, email, phone, address). Loads the full collection, shows it
//! as a table, and submits create/update/delete calls, reloading the whole
//! collection after each successful mutation.
//!
//! Behavior lives in a pure reducer (`state::records`) driven by an async
//! controller; the console is a thin text front end over both.

pub mod config;
pub mod console;
pub mod controller;
pub mod fake_store;
pub mod net;
pub mod state;
