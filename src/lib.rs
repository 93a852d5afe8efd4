//! Booking ETL
//!
//! 予約ログ表（XLSX/CSV）を一定のスキーマに正規化する。
//! 正規化エンジンは `normalizer`、入出力は `sheet`・`batch`・`merge`・`export`。

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod merge;
pub mod normalizer;
pub mod pipeline;
pub mod scanner;
pub mod sheet;
