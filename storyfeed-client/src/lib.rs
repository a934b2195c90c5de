//! Client side of the story feed: backend access, session state and the
//! feed controller presentation code talks to.

pub mod config;
pub mod feed;
pub mod service;
pub mod session;
