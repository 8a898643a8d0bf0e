/// Adapters: port implementations that touch the network, the file
/// system and the terminal
pub mod outbound;
