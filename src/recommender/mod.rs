mod facade;

pub use facade::*;
