//! 正規化テーブル（ルックアップ設定）
//!
//! 料金・流入元・ステータス・お祝い・部屋・年齢層・チーム種別の
//! 対応表をひとつの設定オブジェクトにまとめる。
//! 組み込みプリセット、またはJSONから構築し、正規化エンジンへ明示的に渡す。

use crate::error::{Error, Result};
use crate::text::normalize_text;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 料金の有効範囲（両端含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl PriceRange {
    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }
}

/// 正規表現パターンのグループ（流入元用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternGroup {
    pub name: String,
    pub patterns: Vec<String>,
}

/// 流入元テーブル
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTable {
    /// 空欄時の値
    pub blank_default: String,
    /// 宣言順に評価されるグループ
    pub groups: Vec<PatternGroup>,
}

/// サブグループ → 正規名のグループ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberGroup {
    pub name: String,
    pub members: Vec<String>,
}

/// 完全一致ルックアップ用テーブル（ステータス・お祝い）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupTable {
    /// 空欄時の値
    pub blank_default: String,
    /// 一致しなかった場合の値
    pub fallback: String,
    pub groups: Vec<MemberGroup>,
    /// グループ定義外の追加エイリアス（キー → 正規名）
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl LookupTable {
    /// 正規化キー → 正規名のマップを構築
    ///
    /// 正規名・空欄時の値・フォールバック値自体もキーに含める
    /// （正規名を再分類しても同じ値になる）。
    pub fn key_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        for canonical in [&self.blank_default, &self.fallback] {
            map.insert(normalize_text(canonical), canonical.clone());
        }
        for group in &self.groups {
            map.insert(normalize_text(&group.name), group.name.clone());
            for member in &group.members {
                map.insert(normalize_text(member), group.name.clone());
            }
        }
        for (alias, canonical) in &self.aliases {
            map.insert(normalize_text(alias), canonical.clone());
        }

        map
    }
}

/// 部屋コードとそのエイリアス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomAlias {
    pub code: String,
    pub aliases: Vec<String>,
}

/// 部屋テーブル
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomTable {
    pub aliases: Vec<RoomAlias>,
    /// 許可リスト（空なら全コードを許可）
    pub allowed: Vec<String>,
    /// 除外リスト
    pub rejected: Vec<String>,
}

/// 年齢層（両端含む、`max` 省略時は上限なし）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBracket {
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
    pub label: String,
}

impl AgeBracket {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min && self.max.map_or(true, |max| age <= max)
    }
}

/// 部屋 → 既定年齢層
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomBracket {
    pub rooms: Vec<String>,
    pub label: String,
}

/// 年齢層テーブル
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeTable {
    /// 宣言順に評価（重複区間あり）
    pub brackets: Vec<AgeBracket>,
    pub room_defaults: Vec<RoomBracket>,
    /// どの部屋にも該当しない場合の年齢層
    #[serde(default)]
    pub catch_all: Option<String>,
    /// 判定不能時の値
    pub missing_label: String,
}

/// チーム種別テーブル
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamTypeTable {
    pub always_kids: Vec<String>,
    pub always_grown_up: Vec<String>,
    pub conditional: Vec<String>,
    /// 条件付き部屋で子供扱いになる年齢層
    pub child_brackets: Vec<String>,
    pub kids_label: String,
    pub grown_up_label: String,
    pub unknown_label: String,
}

/// 時刻スロットテーブル
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotTable {
    /// 昇順の "HH:MM"
    pub slots: Vec<String>,
    /// この時刻より前は `early_label`
    pub cutoff: String,
    pub early_label: String,
}

/// 正規化テーブル一式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerTables {
    /// 年 → 既定料金（"50E" 形式）
    pub default_prices: BTreeMap<i32, String>,
    /// 年が見つからない・不正な場合の既定料金
    pub global_default_price: String,
    pub price_range: PriceRange,
    /// 結合セルの後続行を示す値
    pub placeholder_markers: Vec<String>,
    /// クーポン・ギフト券を示すキーワード
    pub coupon_keywords: Vec<String>,
    pub source: SourceTable,
    pub status: LookupTable,
    pub celebration: LookupTable,
    pub rooms: RoomTable,
    pub age: AgeTable,
    pub team: TeamTypeTable,
    pub time: TimeSlotTable,
}

impl Default for NormalizerTables {
    fn default() -> Self {
        Self::city1_preset()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn member_group(name: &str, members: &[&str]) -> MemberGroup {
    MemberGroup {
        name: name.to_string(),
        members: strings(members),
    }
}

fn pattern_group(name: &str, patterns: &[&str]) -> PatternGroup {
    PatternGroup {
        name: name.to_string(),
        patterns: strings(patterns),
    }
}

fn room(code: &str, aliases: &[&str]) -> RoomAlias {
    RoomAlias {
        code: code.to_string(),
        aliases: strings(aliases),
    }
}

fn bracket(min: u32, max: Option<u32>, label: &str) -> AgeBracket {
    AgeBracket {
        min,
        max,
        label: label.to_string(),
    }
}

impl NormalizerTables {
    /// 組み込みプリセットを取得
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "city1" | "default" => Some(Self::city1_preset()),
            _ => None,
        }
    }

    /// JSONファイルから読み込み（省略したテーブルはプリセット値）
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let tables: Self = serde_json::from_str(json)?;
        tables.validate()?;
        Ok(tables)
    }

    /// JSON文字列に変換
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// テーブルの整合性を検証
    ///
    /// - 部屋エイリアスは正規化後に重複しない
    /// - 年齢層は `min <= max`
    /// - 料金範囲は `min <= max`
    pub fn validate(&self) -> Result<()> {
        let mut owners: HashMap<String, &str> = HashMap::new();
        for entry in &self.rooms.aliases {
            let keys = std::iter::once(&entry.code).chain(entry.aliases.iter());
            for key in keys {
                let normalized = normalize_text(key);
                if let Some(owner) = owners.insert(normalized.clone(), &entry.code) {
                    if owner != entry.code {
                        return Err(Error::InvalidTables(format!(
                            "部屋エイリアス {} が {} と {} に重複しています",
                            normalized, owner, entry.code
                        )));
                    }
                }
            }
        }

        for b in &self.age.brackets {
            if let Some(max) = b.max {
                if b.min > max {
                    return Err(Error::InvalidTables(format!(
                        "年齢層 {} の範囲が不正です ({} > {})",
                        b.label, b.min, max
                    )));
                }
            }
        }

        if self.price_range.min > self.price_range.max {
            return Err(Error::InvalidTables(format!(
                "料金範囲が不正です ({} > {})",
                self.price_range.min, self.price_range.max
            )));
        }

        Ok(())
    }

    /// City1 用プリセット
    fn city1_preset() -> Self {
        let default_prices = [
            (2018, "20E"),
            (2019, "20E"),
            (2020, "30E"),
            (2021, "30E"),
            (2022, "40E"),
            (2023, "50E"),
            (2024, "80E"),
            (2025, "100E"),
            (2026, "150E"),
        ]
        .into_iter()
        .map(|(year, price)| (year, price.to_string()))
        .collect();

        let source = SourceTable {
            blank_default: "ONLINE".into(),
            groups: vec![
                pattern_group("ONLINE", &[
                    r"\bINTERNET", r"\bSEARCH_ENGINE\b", r"\bWWW\b",
                    r"LOOKED_ONLINE", r"FOUND_ONLINE", r"ONLINE_SEARCH", r"INTERNET_MISSPELLED",
                ]),
                pattern_group("RETURNING", &[
                    r"\bRETURNED\b", r"\bVISITED_BEFORE\b", r"\bPREVIOUSLY_PLAYED\b",
                    r"ONE_ALREADY_PLAYED", r"PARENTS_VISITED", r"\bVISITED_ROOM\b", r"VISITED_.*ROOM",
                ]),
                pattern_group("COUPON", &[
                    r"\bCOUPON", r"\bGIFT_VOUCHER\b", r"RECEIVED_COUPON", r"COUPON_VARIANT",
                    r"HAD_COUPON", r"CAME_WITH_COUPON",
                ]),
                pattern_group("REFERRED", &[
                    r"REFERRED", r"\bBY_FRIEND\b", r"FRIENDS_REFERRED",
                    r"\bBY_COLLEAGUE\b", r"RECOMMENDATION",
                ]),
                pattern_group("SOCIAL_MEDIA", &[
                    r"\bFACEBOOK\b", r"\bFB\b", r"\bINSTAGRAM\b", r"\bIG\b",
                    r"\bTIKTOK\b", r"\bTRIP_REVIEW\b", r"\bSOCIAL_PLATFORM\b",
                    r"\bSINGLE_W\b",
                ]),
                pattern_group("CAMPS", &[r"\bCAMP\b", r"SCHOOL_CAMP", r"SUMMER_CAMP"]),
            ],
        };

        let mut status_aliases = BTreeMap::new();
        status_aliases.insert("student_group_alias".to_string(), "Students".to_string());

        let status = LookupTable {
            blank_default: "Draugai".into(),
            fallback: "Kita".into(),
            groups: vec![
                member_group("Family", &["family_single", "family_multiple"]),
                member_group("Family_with_friends", &["family_with_friends", "family_with_foreign_friends"]),
                member_group("Students", &[
                    "students", "school_students", "students_mixed", "student_group_variant",
                ]),
                member_group("Foreign_visitors", &["foreign_visitors", "foreign_student_group"]),
                member_group("Colleagues", &["female_colleagues", "colleagues"]),
                member_group("Company_Organization", &["company_organization"]),
                member_group("Friends", &["friends_variant_a", "friends_variant_b"]),
            ],
            aliases: status_aliases,
        };

        let celebration = LookupTable {
            blank_default: "Be šventės".into(),
            fallback: "Be šventės".into(),
            groups: vec![
                member_group("Birthday", &["birthday_party", "surprise_birthday"]),
                member_group("Anniversary", &["wedding_anniversary", "relationship_anniversary"]),
                member_group("Work_Event", &["team_building", "promotion_celebration"]),
                member_group("Holiday", &["new_year", "christmas", "easter"]),
                member_group("Other", &["random_celebration", "just_for_fun"]),
            ],
            aliases: BTreeMap::new(),
        };

        let rooms = RoomTable {
            aliases: vec![
                room("KV1", &["KV1A", "KV1B"]),
                room("AV2", &["AV2A", "AV2B", "AV2C"]),
                room("AS1", &["AS1A", "AS1B", "AS1C", "AS1D", "AS1E", "AS1F", "AS1G", "AS1H", "AS1I", "AS1J"]),
                room("AS2", &["AS2A", "AS2B", "AS2C", "AS2D", "AS2E", "AS2F", "AS2G", "AS2H", "AS2I", "AS2J"]),
                room("KS1", &["KS1A", "KS1B", "KS1C", "KS1D", "KS1E", "KS1F", "KS1G", "KS1H"]),
                room("AS3", &["AS3A", "AS3B", "AS3C"]),
                room("KV3", &["KV3A", "KV3B", "KV3C", "KV3D", "KV3E", "KV3F", "KV3G"]),
                room("KS2", &["KS2A", "KS2B", "KS2C", "KS2D", "KS2E", "KS2F"]),
                room("AS4", &["AS4A", "AS4B", "AS4C", "AS4D", "AS4E"]),
                room("AV1", &["AV1A", "AV1B", "AV1C", "AV1D"]),
                room("KV2", &["KV2A", "KV2B"]),
                room("KS3", &["KS3A"]),
            ],
            allowed: strings(&[
                "AS2", "KS1", "AS1", "AS3", "AV2", "AS4", "KV3", "KV2", "KV1", "AV1", "KS2",
            ]),
            rejected: strings(&["PETRAS"]),
        };

        let age = AgeTable {
            brackets: vec![
                bracket(7, Some(9), "7–9"),
                bracket(10, Some(13), "10–13"),
                bracket(14, Some(17), "14–17"),
                // 下限が前の区間の上限より小さい（評価順で決まる）
                bracket(8, Some(24), "19–24"),
                bracket(25, Some(29), "25–29"),
                bracket(30, Some(40), "30–40"),
                bracket(41, None, "41+"),
            ],
            room_defaults: vec![
                RoomBracket { rooms: strings(&["KV1", "AV2"]), label: "7–9".into() },
                RoomBracket { rooms: strings(&["KV3", "AV1", "KV2"]), label: "10–13".into() },
            ],
            catch_all: Some("25–29".into()),
            missing_label: "N/A".into(),
        };

        let team = TeamTypeTable {
            always_kids: strings(&["KV3", "AV1", "KV2"]),
            always_grown_up: strings(&["KS1", "AS3", "KS2", "AS4", "KS3"]),
            conditional: strings(&["AS1", "AS2", "AV2", "KV1"]),
            child_brackets: strings(&["7–9", "10–13"]),
            kids_label: "Kids".into(),
            grown_up_label: "Grown-up".into(),
            unknown_label: "Unknown".into(),
        };

        let time = TimeSlotTable {
            slots: strings(&["12:00", "14:00", "16:00", "18:00", "20:00", "22:00"]),
            cutoff: "12:00".into(),
            early_label: "10:00".into(),
        };

        Self {
            default_prices,
            global_default_price: "30E".into(),
            price_range: PriceRange { min: 30, max: 600 },
            placeholder_markers: strings(&["", "NO_PRICE", "NAN"]),
            coupon_keywords: strings(&["COUPOUN", "GERA DOVANA", "GIFT", "GIFTY"]),
            source,
            status,
            celebration,
            rooms,
            age,
            team,
            time,
        }
    }
}
