pub mod container;
pub mod machine;
pub mod names;
pub mod ports;
