mod worker;

pub use worker::*;
