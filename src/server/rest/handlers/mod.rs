pub mod jobs;
pub mod labs;
