pub mod analyzers;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod factors;
pub mod fetch;
pub mod importer;
pub mod ledger;
pub mod output;
pub mod parser;
