//! 表 ⇔ バッチの変換
//!
//! ## 処理フロー
//! 1. `prepare_table`: 重複行の削除、日付の解析と年での絞り込み
//! 2. `decode_batch`: 既知の列を `BookingRecord` にデコード（年齢列の名前付けもここ）
//! 3. 正規化（`Normalizer::normalize_batch`）
//! 4. `encode_rows`: 固定の列順で表に戻す

use crate::error::{EtlError, Result};
use crate::sheet::Table;
use booking_etl_common::types::columns;
use booking_etl_common::{is_blank, Batch, BookingRecord, CanonicalRow};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNNAMED_RE: Regex = Regex::new(r"^Unnamed: \d+$").unwrap();
    static ref AGE_N_RE: Regex = Regex::new(r"^Age\d+$").unwrap();
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%d.%m.%Y", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// 日付の解析（日時形式なら日付部分のみ）
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

/// 日付を `YYYY-MM-DD` に揃える（解析できなければ空文字）
pub fn format_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// 前処理の統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareStats {
    pub duplicates: usize,
    pub invalid_dates: usize,
    pub other_year: usize,
    pub kept: usize,
}

/// 正規化前の前処理
///
/// 重複行を削除し、日付が解析できない行・別の年の行を除く。
/// 残った行の日付は `YYYY-MM-DD` になる。
pub fn prepare_table(table: &mut Table, year: i32) -> Result<PrepareStats> {
    let date_col = table
        .column_index(columns::DATE)
        .ok_or_else(|| EtlError::MissingColumn(columns::DATE.to_string()))?;

    let mut stats = PrepareStats {
        duplicates: table.dedup_rows(),
        ..Default::default()
    };

    table.rows.retain_mut(|row| match parse_date(&row[date_col]) {
        None => {
            stats.invalid_dates += 1;
            false
        }
        Some(date) if date.year() != year => {
            stats.other_year += 1;
            false
        }
        Some(date) => {
            row[date_col] = date.format("%Y-%m-%d").to_string();
            true
        }
    });

    stats.kept = table.len();
    Ok(stats)
}

/// 年齢列の判定と名前付け
///
/// `Age` を先頭に、名前のない列（空または `Unnamed: N`）を `Age1`, `Age2`, ... とする。
fn age_columns(headers: &[String]) -> Vec<(usize, String)> {
    let mut result = Vec::new();
    if let Some(idx) = headers.iter().position(|h| h == columns::AGE) {
        result.push((idx, columns::AGE.to_string()));
    }

    let mut extra = 0;
    for (idx, header) in headers.iter().enumerate() {
        if is_blank(header) || UNNAMED_RE.is_match(header) {
            extra += 1;
            result.push((idx, format!("{}{}", columns::AGE, extra)));
        } else if AGE_N_RE.is_match(header) {
            result.push((idx, header.clone()));
        }
    }

    result
}

/// 表をバッチにデコード
pub fn decode_batch(table: &Table, year: i32) -> Batch {
    let ages = age_columns(&table.headers);
    let col = |name: &str| table.column_index(name);
    let date = col(columns::DATE);
    let time = col(columns::TIME);
    let room = col(columns::ROOM);
    let revenue = col(columns::REVENUE);
    let helps = col(columns::HELPS);
    let escape_time = col(columns::ESCAPE_TIME);
    let source = col(columns::SOURCE);
    let status = col(columns::STATUS);
    let celebration = col(columns::CELEBRATION);
    let admin = col(columns::ADMIN);

    let records = (0..table.len())
        .map(|row| {
            let get = |c: Option<usize>| c.map(|c| table.cell(row, c).to_string());
            BookingRecord {
                date: get(date),
                time: get(time),
                room: get(room),
                revenue: get(revenue),
                helps: get(helps),
                escape_time: get(escape_time),
                ages: ages.iter().map(|(c, _)| table.cell(row, *c).to_string()).collect(),
                source: get(source),
                status: get(status),
                celebration: get(celebration),
                admin: get(admin),
            }
        })
        .collect();

    Batch::new(year, ages.into_iter().map(|(_, name)| name).collect(), records)
}

/// 出力に含める列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    pub date: bool,
    pub time: bool,
    pub room: bool,
    pub revenue: bool,
    pub helps: bool,
    pub escape_time: bool,
    /// (出力列名, `BookingRecord::ages` 内の位置)。`Age` は入力になくても空列で出力する
    pub ages: Vec<(String, Option<usize>)>,
    pub source: bool,
    pub status: bool,
    pub celebration: bool,
    pub admin: bool,
}

impl ColumnSet {
    /// バッチに存在する列を調べる
    ///
    /// 年齢列は `Age`, `Age1`..`Age7` のみ出力する。`Age` は年をまたいで列構成を
    /// 揃えるため常に出力する。
    pub fn of(batch: &Batch) -> Self {
        let any = |f: fn(&BookingRecord) -> bool| batch.records.iter().any(f);

        let allowed_ages: Vec<String> = std::iter::once(columns::AGE.to_string())
            .chain((1..=columns::MAX_EXTRA_AGE_COLUMNS).map(|i| format!("{}{}", columns::AGE, i)))
            .collect();
        let ages = allowed_ages
            .into_iter()
            .filter_map(|name| {
                let pos = batch.age_columns.iter().position(|c| *c == name);
                if pos.is_none() && name != columns::AGE {
                    return None;
                }
                Some((name, pos))
            })
            .collect();

        Self {
            date: any(|r| r.date.is_some()),
            time: any(|r| r.time.is_some()),
            room: any(|r| r.room.is_some()),
            revenue: any(|r| r.revenue.is_some()),
            helps: any(|r| r.helps.is_some()),
            escape_time: any(|r| r.escape_time.is_some()),
            ages,
            source: any(|r| r.source.is_some()),
            status: any(|r| r.status.is_some()),
            celebration: any(|r| r.celebration.is_some()),
            admin: any(|r| r.admin.is_some()),
        }
    }

    /// 出力列名（固定順）
    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::new();
        let mut push = |present: bool, name: &str| {
            if present {
                headers.push(name.to_string());
            }
        };

        push(self.date, columns::DATE);
        push(self.time, columns::TIME);
        push(self.room, columns::ROOM);
        push(self.revenue, columns::REVENUE);
        push(self.helps, columns::HELPS);
        push(self.escape_time, columns::ESCAPE_TIME);
        for (name, _) in &self.ages {
            push(true, name);
        }
        push(true, columns::AGE_GROUP);
        push(true, columns::TEAM_TYPE);
        push(self.source, columns::SOURCE);
        push(self.status, columns::STATUS);
        push(self.celebration, columns::CELEBRATION);
        push(self.admin, columns::ADMIN);

        headers
    }
}

/// 正規化後のレコードを表にする
pub fn encode_rows(rows: &[CanonicalRow], columns: &ColumnSet) -> Table {
    let mut table = Table::new(columns.headers());

    for row in rows {
        let mut cells = Vec::with_capacity(table.headers.len());
        let mut push = |present: bool, value: Option<String>| {
            if present {
                cells.push(value.unwrap_or_default());
            }
        };

        push(columns.date, row.date.clone());
        push(columns.time, row.time.clone());
        push(columns.room, row.room.clone());
        push(columns.revenue, row.revenue.clone());
        push(columns.helps, row.helps.map(|h| h.to_string()));
        push(columns.escape_time, row.escape_time.clone());
        for (_, pos) in &columns.ages {
            push(true, pos.and_then(|p| row.ages.get(p).cloned()));
        }
        push(true, Some(row.age_group.clone()));
        push(true, Some(row.team_type.clone()));
        push(columns.source, row.source.clone());
        push(columns.status, row.status.clone());
        push(columns.celebration, row.celebration.clone());
        push(columns.admin, row.admin.clone());

        table.push_row(cells);
    }

    table
}
