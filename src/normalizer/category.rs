//! カテゴリ分類（流入元・ステータス・お祝い）
//!
//! - 流入元: 宣言順の正規表現グループで検索、最初に一致したグループ名を返す。
//!   一致しなければ正規化済みテキストをそのまま返す。
//! - ステータス・お祝い: 正規化キーの完全一致。一致しなければフォールバック値。

use crate::error::{EtlError, Result};
use booking_etl_common::tables::{LookupTable, SourceTable};
use booking_etl_common::text::{is_blank, normalize_text};
use regex::Regex;
use std::collections::HashMap;

/// 流入元の分類器
#[derive(Debug, Clone)]
pub struct SourceClassifier {
    blank_default: String,
    /// (パターン, グループ名) を宣言順に並べたもの
    rules: Vec<(Regex, String)>,
    group_names: Vec<String>,
}

impl SourceClassifier {
    pub fn new(table: &SourceTable) -> Result<Self> {
        let mut rules = Vec::new();
        for group in &table.groups {
            for pattern in &group.patterns {
                let re = Regex::new(pattern).map_err(|e| {
                    EtlError::InvalidTables(format!("流入元パターン {} ({}): {}", pattern, group.name, e))
                })?;
                rules.push((re, group.name.clone()));
            }
        }

        Ok(Self {
            blank_default: table.blank_default.clone(),
            rules,
            group_names: table.groups.iter().map(|g| g.name.clone()).collect(),
        })
    }

    /// 流入元を分類する
    pub fn classify(&self, raw: Option<&str>) -> String {
        let raw = match raw {
            Some(text) if !is_blank(text) => text,
            _ => return self.blank_default.clone(),
        };

        let normalized = normalize_text(raw);

        if let Some(name) = self.group_names.iter().find(|name| **name == normalized) {
            return name.clone();
        }

        self.rules
            .iter()
            .find(|(re, _)| re.is_match(&normalized))
            .map(|(_, name)| name.clone())
            .unwrap_or(normalized)
    }
}

/// 空欄とみなす値の規則
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankRule {
    /// 空白のみ
    Whitespace,
    /// 空白とカンマのみ
    WhitespaceOrComma,
}

impl BlankRule {
    fn is_blank(self, value: &str) -> bool {
        match self {
            BlankRule::Whitespace => is_blank(value),
            BlankRule::WhitespaceOrComma => value.chars().all(|c| c.is_whitespace() || c == ','),
        }
    }
}

/// 完全一致ルックアップの分類器（ステータス・お祝い）
#[derive(Debug, Clone)]
pub struct LookupClassifier {
    blank_default: String,
    fallback: String,
    keys: HashMap<String, String>,
    blank: BlankRule,
}

impl LookupClassifier {
    pub fn new(table: &LookupTable) -> Self {
        Self {
            blank_default: table.blank_default.clone(),
            fallback: table.fallback.clone(),
            keys: table.key_map(),
            blank: BlankRule::Whitespace,
        }
    }

    /// ステータス用: 空白とカンマだけの値も空欄とみなす
    pub fn for_status(table: &LookupTable) -> Self {
        Self {
            blank: BlankRule::WhitespaceOrComma,
            ..Self::new(table)
        }
    }

    pub fn classify(&self, raw: Option<&str>) -> String {
        match raw {
            Some(text) if !self.blank.is_blank(text) => self
                .keys
                .get(&normalize_text(text))
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()),
            _ => self.blank_default.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_etl_common::NormalizerTables;

    fn source() -> SourceClassifier {
        SourceClassifier::new(&NormalizerTables::default().source).unwrap()
    }

    fn status() -> LookupClassifier {
        LookupClassifier::for_status(&NormalizerTables::default().status)
    }

    fn celebration() -> LookupClassifier {
        LookupClassifier::new(&NormalizerTables::default().celebration)
    }

    #[test]
    fn test_source_social_media() {
        assert_eq!(source().classify(Some("Draugas paziurejo i FB")), "SOCIAL_MEDIA");
        assert_eq!(source().classify(Some("Draugas pažiūrėjo į FB")), "SOCIAL_MEDIA");
    }

    #[test]
    fn test_source_group_order() {
        // COUPON グループは REFERRED より先に評価される
        assert_eq!(source().classify(Some("had_coupon referred")), "COUPON");
        assert_eq!(source().classify(Some("internete")), "ONLINE");
        assert_eq!(source().classify(Some("summer_camp")), "CAMPS");
    }

    #[test]
    fn test_source_blank() {
        assert_eq!(source().classify(None), "ONLINE");
        assert_eq!(source().classify(Some("   ")), "ONLINE");
    }

    #[test]
    fn test_source_pass_through() {
        assert_eq!(source().classify(Some("  radijas ")), "RADIJAS");
        assert_eq!(source().classify(Some("Žurnalas")), "ZURNALAS");
    }

    #[test]
    fn test_source_idempotent() {
        let c = source();
        for name in ["ONLINE", "RETURNING", "COUPON", "REFERRED", "SOCIAL_MEDIA", "CAMPS"] {
            assert_eq!(c.classify(Some(name)), name);
        }
    }

    #[test]
    fn test_source_invalid_pattern() {
        let mut table = NormalizerTables::default().source;
        table.groups[0].patterns.push("(".into());
        assert!(matches!(SourceClassifier::new(&table), Err(EtlError::InvalidTables(_))));
    }

    #[test]
    fn test_status_lookup() {
        let c = status();
        assert_eq!(c.classify(Some(" School_Students ")), "Students");
        assert_eq!(c.classify(Some("student_group_alias")), "Students");
        assert_eq!(c.classify(Some("colleagues")), "Colleagues");
        assert_eq!(c.classify(Some("kaimynai")), "Kita");
    }

    #[test]
    fn test_status_blank() {
        let c = status();
        assert_eq!(c.classify(None), "Draugai");
        assert_eq!(c.classify(Some("")), "Draugai");
        assert_eq!(c.classify(Some(" , ,")), "Draugai");
    }

    #[test]
    fn test_celebration_lookup() {
        let c = celebration();
        assert_eq!(c.classify(Some("birthday_party")), "Birthday");
        assert_eq!(c.classify(Some("christmas")), "Holiday");
        assert_eq!(c.classify(Some("vestuves")), "Be šventės");
        assert_eq!(c.classify(None), "Be šventės");
        // カンマのみはステータス以外では空欄扱いしない
        assert_eq!(c.classify(Some(",")), "Be šventės");
    }

    #[test]
    fn test_lookup_idempotent() {
        let s = status();
        for name in ["Family", "Family_with_friends", "Students", "Friends", "Kita", "Draugai"] {
            assert_eq!(s.classify(Some(name)), name);
        }
        let c = celebration();
        for name in ["Birthday", "Anniversary", "Work_Event", "Holiday", "Other", "Be šventės"] {
            assert_eq!(c.classify(Some(name)), name);
        }
    }
}
