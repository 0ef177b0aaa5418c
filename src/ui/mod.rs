//! egui rendering of a picking session.

pub mod panels;
pub mod plot;
