pub mod logfile;
pub mod project;
