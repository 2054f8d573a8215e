// Slash and prefix commands
pub mod channels;
pub mod help;
pub mod info;
