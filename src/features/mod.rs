mod space;

pub use space::*;
