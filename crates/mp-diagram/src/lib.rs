//! # mp-diagram
//!
//! Turns the text report into a diagram request for a text-generation
//! model and turns the model's free-form answer back into a small diagram
//! that always parses.
//!
//! The network call itself is behind [`TextGenerator`]; this crate only
//! builds the prompt ([`build_prompt`]), picks among candidate models
//! ([`DiagramService`]) and sanitizes the result ([`sanitize`]).

pub mod error;
pub mod notation;
pub mod prompt;
pub mod sanitize;
pub mod service;

pub use error::DiagramError;
pub use notation::{DetailLevel, Notation};
pub use prompt::{build_prompt, load_report};
pub use sanitize::sanitize;
pub use service::{DiagramRequest, DiagramResponse, DiagramService, TextGenerator};
