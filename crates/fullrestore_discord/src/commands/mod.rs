//! Slash command handlers, one module per top-level command.

pub mod match_report;
pub mod pairing;
pub mod player;
pub mod round;
pub mod signup;
pub mod tournament;
pub mod withdraw;
