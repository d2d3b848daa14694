// Core module - Bridge logic and the seams it talks through
pub mod bridge;
pub mod reset;
pub mod transport;
