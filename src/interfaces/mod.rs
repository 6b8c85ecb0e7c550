pub mod cli;
pub mod doctor;
