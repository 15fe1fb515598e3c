pub mod build;
pub mod cluster;
pub mod controller;
pub mod deployment;
pub mod log_files;
pub mod simulation;

pub use build::*;
pub use cluster::*;
pub use controller::*;
pub use deployment::*;
pub use log_files::*;
pub use simulation::*;
