//! The single "active waypoint" shared by map, gallery, elevation chart and
//! viewer, and the autonomous playback that moves it.
pub mod controller;
pub mod playback;
pub mod structs;
