//! Scene composition: filter construction, per-scene rendering and final assembly.

pub mod assembler;
pub mod assets;
pub mod effects;
pub mod filters;
pub mod fonts;
pub mod profile;
pub mod scene;
pub mod text;
pub mod workspace;
