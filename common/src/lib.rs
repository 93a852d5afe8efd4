//! Booking ETL Common Library
//!
//! 正規化エンジンとCLIで共有される型・テーブル・テキスト処理

pub mod error;
pub mod tables;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use tables::{AgeBracket, LookupTable, NormalizerTables, PriceRange, RoomAlias};
pub use text::{clean_text, is_blank, normalize_text};
pub use types::{Batch, BookingRecord, CanonicalRow};
