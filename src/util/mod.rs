//! Small internal helpers.

pub mod json;
