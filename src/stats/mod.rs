pub mod client;
pub mod result_set;
pub mod source;

#[cfg(test)]
pub mod fake;

pub use client::StatsClient;
pub use result_set::parse_result_sets;
pub use source::StatsSource;
