// Testing Tools Library
//
// This crate provides testing utilities and tools for Postboard.
// Currently includes:
// - ws-test-client: end-to-end check of live post notifications over /ws

pub mod api_client;
pub mod auth;
pub mod output;
pub mod scenarios;
pub mod ws_client;
