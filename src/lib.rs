pub mod delays;
pub mod fetch;
pub mod journey;
pub mod layout;
pub mod network;
pub mod output;
pub mod parser;
pub mod poll;
pub mod reconcile;
