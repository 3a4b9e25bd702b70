pub mod dataset;
pub mod measure_memory;
pub mod measure_time;
pub mod subject;
