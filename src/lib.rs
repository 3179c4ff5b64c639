pub mod assertions;
pub mod config;
pub mod outputs;
pub mod sam;
pub mod stack;
pub mod template;
pub mod writer;
