//! 料金の復元
//!
//! Excelの結合セル（複数行にまたがる合計料金）を行ごとの料金に分割する。
//!
//! 例: `"160"` が3行に結合、既定料金30E → `[100E, 30E, 30E]`
//!
//! ## 処理フロー
//! 1. 行を先頭から走査し、ブロック単位に分割（`partition`）
//! 2. ブロックごとに先頭行へ残額、後続行へ既定料金を割り当て（`reconstruct`）

use booking_etl_common::text::{first_integer, integer_tokens};
use booking_etl_common::{NormalizerTables, PriceRange};
use std::collections::BTreeMap;

/// 既定料金の設定がすべて不正な場合の値
pub const FALLBACK_DEFAULT_PRICE: u32 = 30;

/// 料金の由来
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceOrigin {
    /// ブロック先頭（合計 − 既定料金×後続行数）
    BlockHead,
    /// ブロック後続行（既定料金）
    BlockMember,
    /// クーポン・ギフト券（既定料金）
    Coupon,
    /// 数値なし（既定料金）
    Default,
}

/// 復元した1行分の料金
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructedPrice {
    pub amount: u32,
    pub origin: PriceOrigin,
}

impl ReconstructedPrice {
    /// "<整数>E" 形式
    pub fn render(&self) -> String {
        format!("{}E", self.amount)
    }
}

/// 走査で得られる区間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSegment {
    /// 有効な合計を持つ先頭行 + `members` 行の後続行
    Block { start: usize, total: u32, members: usize },
    /// クーポン行（1行）
    Coupon { index: usize },
    /// 数値のない行（1行）
    Single { index: usize },
}

impl PriceSegment {
    /// 区間の行数
    pub fn len(&self) -> usize {
        match self {
            PriceSegment::Block { members, .. } => members + 1,
            PriceSegment::Coupon { .. } | PriceSegment::Single { .. } => 1,
        }
    }
}

/// 料金復元器
#[derive(Debug, Clone)]
pub struct PriceReconstructor {
    default_prices: BTreeMap<i32, String>,
    global_default: String,
    range: PriceRange,
    placeholders: Vec<String>,
    coupon_keywords: Vec<String>,
}

impl PriceReconstructor {
    pub fn new(tables: &NormalizerTables) -> Self {
        Self {
            default_prices: tables.default_prices.clone(),
            global_default: tables.global_default_price.clone(),
            range: tables.price_range,
            placeholders: tables
                .placeholder_markers
                .iter()
                .map(|m| m.trim().to_uppercase())
                .collect(),
            coupon_keywords: tables
                .coupon_keywords
                .iter()
                .map(|k| k.to_uppercase())
                .collect(),
        }
    }

    /// 年ごとの既定料金
    ///
    /// 年が未定義・値が不正 → 全体の既定料金 → 組み込み定数の順にフォールバックする。
    pub fn default_price_for(&self, year: i32) -> u32 {
        self.default_prices
            .get(&year)
            .and_then(|price| first_integer(price))
            .or_else(|| first_integer(&self.global_default))
            .unwrap_or(FALLBACK_DEFAULT_PRICE)
    }

    /// 後続行（結合セルの一部）を示す値か判定
    pub fn is_placeholder(&self, value: &str) -> bool {
        let value = value.trim().to_uppercase();
        self.placeholders.iter().any(|p| *p == value)
    }

    /// 範囲内の最初の数値トークン
    fn first_valid_total(&self, value: &str) -> Option<u32> {
        integer_tokens(value).find(|n| self.range.contains(*n))
    }

    fn is_coupon(&self, value: &str) -> bool {
        self.coupon_keywords.iter().any(|k| value.contains(k.as_str()))
    }

    /// 料金列をブロック単位に分割する
    pub fn partition<S: AsRef<str>>(&self, values: &[S]) -> Vec<PriceSegment> {
        let values: Vec<String> = values
            .iter()
            .map(|v| v.as_ref().trim().to_uppercase())
            .collect();

        let mut segments = Vec::new();
        let mut i = 0;

        while i < values.len() {
            let value = &values[i];

            if let Some(total) = self.first_valid_total(value) {
                let members = values[i + 1..]
                    .iter()
                    .take_while(|v| self.is_placeholder(v))
                    .count();
                let segment = PriceSegment::Block { start: i, total, members };
                i += segment.len();
                segments.push(segment);
                continue;
            }

            if self.is_coupon(value) {
                segments.push(PriceSegment::Coupon { index: i });
            } else {
                segments.push(PriceSegment::Single { index: i });
            }
            i += 1;
        }

        segments
    }

    /// 料金列を行ごとの料金に復元する
    ///
    /// 出力は入力と同じ長さで、各値は `[default_price, 範囲上限]` に収まる。
    pub fn reconstruct<S: AsRef<str>>(&self, values: &[S], default_price: u32) -> Vec<ReconstructedPrice> {
        let mut prices = Vec::with_capacity(values.len());

        for segment in self.partition(values) {
            match segment {
                PriceSegment::Block { total, members, .. } => {
                    let reserved = default_price.saturating_mul(members as u32);
                    let leftover = total.saturating_sub(reserved).max(default_price);
                    prices.push(ReconstructedPrice {
                        amount: leftover,
                        origin: PriceOrigin::BlockHead,
                    });
                    prices.extend(std::iter::repeat(ReconstructedPrice {
                        amount: default_price,
                        origin: PriceOrigin::BlockMember,
                    }).take(members));
                }
                PriceSegment::Coupon { .. } => prices.push(ReconstructedPrice {
                    amount: default_price,
                    origin: PriceOrigin::Coupon,
                }),
                PriceSegment::Single { .. } => prices.push(ReconstructedPrice {
                    amount: default_price,
                    origin: PriceOrigin::Default,
                }),
            }
        }

        prices
    }
}

/// 復元結果を "<整数>E" の列に変換
pub fn render_prices(prices: &[ReconstructedPrice]) -> Vec<String> {
    prices.iter().map(ReconstructedPrice::render).collect()
}
