pub mod implementations;
pub mod optimization;
pub mod tracker;
pub mod traits;
