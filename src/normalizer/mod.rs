//! 正規化エンジン
//!
//! 1ファイル（1年分）のレコード列を受け取り、列ごとに正規化する。
//!
//! ## 処理フロー
//! 1. 開始時刻の補完・丸め（空セルは直前の値で補完）
//! 2. 部屋コードの標準化と行の除外
//! 3. 料金の復元（結合セルの分割）
//! 4. 脱出時間・ヒント数・担当者のクリーニング
//! 5. 流入元・ステータス・お祝いの分類
//! 6. 年齢層・チーム種別の推定

pub mod category;
pub mod demographic;
pub mod fields;
pub mod price;
pub mod room;
pub mod time_slot;

use crate::error::Result;
use booking_etl_common::{Batch, BookingRecord, CanonicalRow, NormalizerTables};
use category::{LookupClassifier, SourceClassifier};
use demographic::{AgeClassifier, TeamTypeClassifier};
use price::{PriceOrigin, PriceReconstructor};
use room::{RoomDecision, RoomStandardizer};
use time_slot::TimeRounder;

/// 正規化の統計情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// 入力レコード数
    pub total_records: usize,
    /// 出力レコード数
    pub kept_records: usize,
    /// 部屋が解決できず除外した数
    pub unresolved_rooms: usize,
    /// 除外リスト・許可リスト外で除外した数
    pub rejected_rooms: usize,
    /// この年の既定料金
    pub default_price: u32,
    /// 結合セルのブロック数
    pub price_blocks: usize,
    /// 結合セルの後続行数
    pub merged_price_rows: usize,
    /// クーポン行数
    pub coupon_rows: usize,
    /// 料金なしで既定料金にした行数
    pub defaulted_prices: usize,
    /// 時刻を解析できなかった行数
    pub invalid_times: usize,
}

/// 正規化結果
#[derive(Debug, Clone, Default)]
pub struct NormalizationResult {
    pub rows: Vec<CanonicalRow>,
    pub stats: NormalizationStats,
}

/// テーブルから構築した正規化器一式
#[derive(Debug, Clone)]
pub struct Normalizer {
    prices: PriceReconstructor,
    source: SourceClassifier,
    status: LookupClassifier,
    celebration: LookupClassifier,
    rooms: RoomStandardizer,
    times: TimeRounder,
    ages: AgeClassifier,
    teams: TeamTypeClassifier,
}

impl Normalizer {
    /// テーブルを検証し、正規化器を構築する
    pub fn new(tables: &NormalizerTables) -> Result<Self> {
        tables.validate()?;

        Ok(Self {
            prices: PriceReconstructor::new(tables),
            source: SourceClassifier::new(&tables.source)?,
            status: LookupClassifier::for_status(&tables.status),
            celebration: LookupClassifier::new(&tables.celebration),
            rooms: RoomStandardizer::new(&tables.rooms),
            times: TimeRounder::new(&tables.time)?,
            ages: AgeClassifier::new(&tables.age),
            teams: TeamTypeClassifier::new(&tables.team),
        })
    }

    /// バッチを正規化する
    ///
    /// # Arguments
    /// * `batch` - 1ファイル分のレコード（元の行順）
    ///
    /// # Returns
    /// 正規化後のレコード（部屋で除外した行を除く）と統計情報
    pub fn normalize_batch(&self, batch: &Batch) -> NormalizationResult {
        let records = &batch.records;
        let mut stats = NormalizationStats {
            total_records: records.len(),
            default_price: self.prices.default_price_for(batch.year),
            ..Default::default()
        };

        // 1. 時刻（除外前の全行で補完する）
        let times: Option<Vec<String>> = column(records, |r| r.time.as_deref())
            .map(|values| self.times.round_column(&values));
        if let Some(times) = &times {
            stats.invalid_times = times.iter().filter(|t| t.is_empty()).count();
        }

        // 2. 部屋
        let has_room_column = records.iter().any(|r| r.room.is_some());
        let mut kept: Vec<(usize, Option<String>)> = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if !has_room_column {
                kept.push((index, None));
                continue;
            }
            match self.rooms.decide(record.room.as_deref().unwrap_or_default()) {
                RoomDecision::Keep(code) => kept.push((index, Some(code))),
                RoomDecision::Unresolved => stats.unresolved_rooms += 1,
                RoomDecision::Rejected(code) => {
                    tracing::debug!(room = %code, row = index, "除外対象の部屋");
                    stats.rejected_rooms += 1;
                }
            }
        }
        let retained: Vec<&BookingRecord> = kept.iter().map(|(i, _)| &records[*i]).collect();

        // 3. 料金
        let revenues = column(&retained, |r| r.revenue.as_deref()).map(|values| {
            let prices = self.prices.reconstruct(&values, stats.default_price);
            for p in &prices {
                match p.origin {
                    PriceOrigin::BlockHead => stats.price_blocks += 1,
                    PriceOrigin::BlockMember => stats.merged_price_rows += 1,
                    PriceOrigin::Coupon => stats.coupon_rows += 1,
                    PriceOrigin::Default => stats.defaulted_prices += 1,
                }
            }
            price::render_prices(&prices)
        });

        // 4. 担当者
        let admins = column(&retained, |r| r.admin.as_deref())
            .map(|values| fields::clean_admin_column(&values));

        // 5-6. 行ごとの変換
        let rows: Vec<CanonicalRow> = kept
            .iter()
            .enumerate()
            .map(|(pos, (index, room))| {
                let record = &records[*index];
                let age_group = self.ages.classify(&record.ages, room.as_deref());
                let team_type = self.teams.classify(room.as_deref(), &age_group);

                CanonicalRow {
                    date: record.date.clone(),
                    time: times.as_ref().map(|t| t[*index].clone()),
                    room: room.clone(),
                    revenue: revenues.as_ref().map(|r| r[pos].clone()),
                    helps: record.helps.as_deref().map(fields::clean_helps),
                    escape_time: record.escape_time.as_deref().map(fields::clean_escape_time),
                    ages: record.ages.clone(),
                    age_group,
                    team_type,
                    source: record.source.as_deref().map(|s| self.source.classify(Some(s))),
                    status: record.status.as_deref().map(|s| self.status.classify(Some(s))),
                    celebration: record
                        .celebration
                        .as_deref()
                        .map(|s| self.celebration.classify(Some(s))),
                    admin: admins.as_ref().map(|a| a[pos].clone()),
                }
            })
            .collect();

        stats.kept_records = rows.len();
        tracing::info!(
            year = batch.year,
            total = stats.total_records,
            kept = stats.kept_records,
            unresolved_rooms = stats.unresolved_rooms,
            rejected_rooms = stats.rejected_rooms,
            price_blocks = stats.price_blocks,
            "バッチを正規化しました"
        );

        NormalizationResult { rows, stats }
    }
}

/// 列が存在すれば、その値（空セルは ""）を行順に取り出す
fn column<'a, R, F>(records: &'a [R], accessor: F) -> Option<Vec<&'a str>>
where
    R: std::borrow::Borrow<BookingRecord> + 'a,
    F: Fn(&'a BookingRecord) -> Option<&'a str>,
{
    if !records.iter().any(|r| accessor(r.borrow()).is_some()) {
        return None;
    }
    Some(
        records
            .iter()
            .map(|r| accessor(r.borrow()).unwrap_or_default())
            .collect(),
    )
}
