pub mod aggregator;
#[cfg(feature = "bert")]
pub mod bert;
pub mod keywords;
pub mod lexicon;
pub mod report;
pub mod sentiment;
pub mod themes;
