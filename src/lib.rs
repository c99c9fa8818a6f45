// Library root: re-exports all modules so integration tests can `use myplayer::*`.

pub mod action;
pub mod api;
pub mod app;
pub mod canvas;
pub mod components;
pub mod config;
pub mod host;
pub mod library;
pub mod logging;
pub mod player;
pub mod storage;
pub mod theme;
pub mod tui;
pub mod ui;
pub mod visualizer;
