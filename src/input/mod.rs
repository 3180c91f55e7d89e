// Controller buttons and menu bindings.

pub mod controller;

pub use controller::{ButtonMapping, XboxButton};
