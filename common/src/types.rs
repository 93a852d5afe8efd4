//! 予約レコードの型定義
//!
//! - BookingRecord: 入力境界でデコードした生レコード
//! - Batch: 1ファイル（1年分）のレコード列
//! - CanonicalRow: 正規化後の出力レコード
//!
//! `Option` の `None` は「その列がバッチに存在しない」ことを表す。
//! 空セルは `Some("")`。

use serde::{Deserialize, Serialize};

/// 既知の列名
pub mod columns {
    pub const DATE: &str = "Date";
    pub const TIME: &str = "Time";
    pub const ROOM: &str = "Room Type";
    pub const REVENUE: &str = "Revenue";
    pub const HELPS: &str = "Helps";
    pub const ESCAPE_TIME: &str = "Escape Time";
    pub const AGE: &str = "Age";
    pub const AGE_GROUP: &str = "Age Group";
    pub const TEAM_TYPE: &str = "TeamType";
    pub const SOURCE: &str = "Source";
    pub const STATUS: &str = "Status";
    pub const CELEBRATION: &str = "Celebration";
    pub const ADMIN: &str = "Admin";

    /// 出力時に保持する年齢列の最大番号（Age1..Age7）
    pub const MAX_EXTRA_AGE_COLUMNS: usize = 7;
}

/// 生レコード
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub date: Option<String>,
    pub time: Option<String>,
    pub room: Option<String>,
    pub revenue: Option<String>,
    pub helps: Option<String>,
    pub escape_time: Option<String>,
    /// 年齢列の値（`Batch::age_columns` と同じ順序・長さ）
    #[serde(default)]
    pub ages: Vec<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub celebration: Option<String>,
    pub admin: Option<String>,
}

/// 1ファイル分のレコード列
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// ファイル名から取得した年
    pub year: i32,
    /// 年齢列名（優先順: Age, Age1, Age2, ...）
    pub age_columns: Vec<String>,
    pub records: Vec<BookingRecord>,
}

impl Batch {
    pub fn new(year: i32, age_columns: Vec<String>, records: Vec<BookingRecord>) -> Self {
        Self { year, age_columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// 正規化後のレコード
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub date: Option<String>,
    /// "HH:MM"（判定不能時は空文字）
    pub time: Option<String>,
    pub room: Option<String>,
    /// "<整数>E"
    pub revenue: Option<String>,
    pub helps: Option<i64>,
    /// 分（小数2桁）、判定不能時は "-"
    pub escape_time: Option<String>,
    pub ages: Vec<String>,
    pub age_group: String,
    pub team_type: String,
    pub source: Option<String>,
    pub status: Option<String>,
    pub celebration: Option<String>,
    pub admin: Option<String>,
}
