pub mod chain;
pub mod node;
pub mod observation;
pub mod queues;
