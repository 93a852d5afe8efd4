//! 開始時刻の丸め
//!
//! 任意の時刻を固定の時間枠（12:00, 14:00, ... 22:00）に丸める。
//! 12:00より前は一律に早朝枠（10:00）とする。

use crate::error::{EtlError, Result};
use booking_etl_common::tables::TimeSlotTable;
use booking_etl_common::text::is_blank;
use chrono::NaiveTime;

/// 時刻の解析（`HH:MM:SS` → `HH:MM` の順に試す）
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// 時間枠への丸め器
#[derive(Debug, Clone)]
pub struct TimeRounder {
    /// 昇順の時間枠
    slots: Vec<(NaiveTime, String)>,
    cutoff: NaiveTime,
    early_label: String,
}

impl TimeRounder {
    pub fn new(table: &TimeSlotTable) -> Result<Self> {
        let parse = |value: &str| {
            NaiveTime::parse_from_str(value, "%H:%M")
                .map_err(|_| EtlError::InvalidTables(format!("時間枠 {} を解析できません", value)))
        };

        let mut slots = table
            .slots
            .iter()
            .map(|s| Ok((parse(s)?, s.clone())))
            .collect::<Result<Vec<_>>>()?;
        slots.sort_by_key(|(time, _)| *time);

        if slots.is_empty() {
            return Err(EtlError::InvalidTables("時間枠が空です".into()));
        }

        Ok(Self {
            slots,
            cutoff: parse(&table.cutoff)?,
            early_label: table.early_label.clone(),
        })
    }

    /// 時刻を時間枠のラベルに丸める
    ///
    /// 差が最小の枠を選ぶ。差が同じ場合は早い枠が優先される。
    pub fn round(&self, time: NaiveTime) -> &str {
        if time < self.cutoff {
            return &self.early_label;
        }

        let mut best = &self.slots[0];
        let mut best_diff = i64::MAX;
        for slot in &self.slots {
            let diff = (time - slot.0).num_seconds().abs();
            if diff < best_diff {
                best_diff = diff;
                best = slot;
            }
        }

        &best.1
    }

    /// 時刻列を丸める
    ///
    /// 空セルは直前の値で埋めてから（結合セル対策）解析する。
    /// 解析できない値は空文字になる。
    pub fn round_column<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        let mut last: Option<&str> = None;

        values
            .iter()
            .map(|value| {
                let value = value.as_ref();
                if !is_blank(value) {
                    last = Some(value);
                }
                last.and_then(parse_time)
                    .map(|time| self.round(time).to_string())
                    .unwrap_or_default()
            })
            .collect()
    }
}
