//! Core call-handling logic for the phone teacher service: the dialogue
//! controller and the collaborators it drives. Nothing in this crate knows
//! about HTTP; the API service wires these pieces to webhook endpoints.

pub mod credentials;
pub mod dialogue;
pub mod llm_client;
pub mod persona;
pub mod prompt_store;
pub mod speech;
pub mod voice;
