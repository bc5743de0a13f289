//! Creator Studio: raw script in, narrated and captioned short-form video out,
//! optionally certified on a ledger.
//!
//! Stages live in their own modules behind one trait each; [`pipeline`]
//! sequences them and [`server`] exposes the result over HTTP.

pub mod artifact;
pub mod config;
pub mod narration;
pub mod pipeline;
pub mod publish;
pub mod script;
pub mod server;
pub mod video;
