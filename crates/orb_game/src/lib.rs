pub mod archetype;
pub mod atlas;
pub mod behavior;
pub mod config;
pub mod entity;
pub mod floor;
pub mod game;
pub mod inspector;
pub mod kappler;
pub mod physics;
pub mod replay;
pub mod resources;
pub mod woody;
