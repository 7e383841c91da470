// Game bridge — Tauri shell
// Hosts the demo page and exposes the `bridge` operations to its script.
// All host-side behaviour lives in the library crate.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    game_bridge::run();
}
