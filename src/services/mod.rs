// Service module exports

pub mod conflict;
pub mod drag;
pub mod generation;
pub mod layout;
pub mod mutation;
pub mod notice;
