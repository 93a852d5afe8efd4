//! 部屋コードの標準化
//!
//! 表記ゆれのある部屋名をエイリアス表で正規コードに変換する。
//! 解決できない部屋・除外リストの部屋の行は出力から取り除く。

use booking_etl_common::tables::RoomTable;
use booking_etl_common::text::normalize_text;
use std::collections::HashSet;

/// 行フィルタの判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomDecision {
    /// 出力に残す（正規コード）
    Keep(String),
    /// 解決できなかった
    Unresolved,
    /// 除外リストまたは許可リスト外
    Rejected(String),
}

/// 部屋コードの標準化器
#[derive(Debug, Clone)]
pub struct RoomStandardizer {
    /// (正規コード, 正規化済みコード, 正規化済みエイリアス) を宣言順に保持
    entries: Vec<(String, String, Vec<String>)>,
    allowed: HashSet<String>,
    rejected: HashSet<String>,
}

impl RoomStandardizer {
    pub fn new(table: &RoomTable) -> Self {
        let entries = table
            .aliases
            .iter()
            .map(|entry| {
                (
                    entry.code.clone(),
                    normalize_text(&entry.code),
                    entry.aliases.iter().map(|a| normalize_text(a)).collect(),
                )
            })
            .collect();

        Self {
            entries,
            allowed: table.allowed.iter().map(|r| normalize_text(r)).collect(),
            rejected: table.rejected.iter().map(|r| normalize_text(r)).collect(),
        }
    }

    /// 部屋名を正規コードに変換（未解決なら `None`）
    ///
    /// 正規コードとの一致を先に、次にエイリアスとの一致を調べる。
    pub fn standardize(&self, raw: &str) -> Option<&str> {
        let normalized = normalize_text(raw);
        if normalized.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|(_, code, aliases)| *code == normalized || aliases.contains(&normalized))
            .map(|(canonical, _, _)| canonical.as_str())
    }

    /// 行を残すかどうか判定
    pub fn decide(&self, raw: &str) -> RoomDecision {
        let code = match self.standardize(raw) {
            Some(code) => code,
            None => return RoomDecision::Unresolved,
        };

        let key = normalize_text(code);
        let allowed = self.allowed.is_empty() || self.allowed.contains(&key);
        if self.rejected.contains(&key) || !allowed {
            return RoomDecision::Rejected(code.to_string());
        }

        RoomDecision::Keep(code.to_string())
    }

}
