pub mod resolver;
pub mod verify;
