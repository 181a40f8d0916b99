//! LaTeX generation: escaping, inline bullet markup, and per-category
//! fragment assembly.

pub mod escape;
pub mod fragments;
