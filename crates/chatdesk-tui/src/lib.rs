//! chatdesk-tui: terminal widgets for the chatdesk client
//!
//! Bubbles, agent badges, suggestion chips and the agent picker, built on
//! ratatui and crossterm.

pub mod input;
pub mod theme;
pub mod widgets;

pub use theme::Theme;
