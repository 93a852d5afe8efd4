//! 年齢層・チーム種別の推定
//!
//! - 年齢列（Age, Age1, Age2, ...）を優先順に調べ、最初に見つかった整数を年齢とする
//! - 年齢層表を宣言順に評価（区間は重複しうる。先に一致した区間が優先）
//! - 年齢が取れない・どの区間にも入らない場合は部屋ごとの既定年齢層
//! - 部屋と年齢層からチーム種別（子供/大人）を決める

use booking_etl_common::tables::{AgeBracket, AgeTable, TeamTypeTable};
use booking_etl_common::text::first_integer;

/// 年齢層の推定器
#[derive(Debug, Clone)]
pub struct AgeClassifier {
    brackets: Vec<AgeBracket>,
    /// (部屋コード一覧, 年齢層) を宣言順に保持
    room_defaults: Vec<(Vec<String>, String)>,
    catch_all: Option<String>,
    missing_label: String,
}

impl AgeClassifier {
    pub fn new(table: &AgeTable) -> Self {
        Self {
            brackets: table.brackets.clone(),
            room_defaults: table
                .room_defaults
                .iter()
                .map(|r| (r.rooms.clone(), r.label.clone()))
                .collect(),
            catch_all: table.catch_all.clone(),
            missing_label: table.missing_label.clone(),
        }
    }

    /// 年齢列から最初の整数を取り出す
    pub fn extract_age<S: AsRef<str>>(fields: &[S]) -> Option<u32> {
        fields.iter().find_map(|f| first_integer(f.as_ref()))
    }

    /// 年齢を年齢層に分類（最初に一致した区間）
    pub fn bracket_for(&self, age: u32) -> Option<&str> {
        self.brackets
            .iter()
            .find(|b| b.contains(age))
            .map(|b| b.label.as_str())
    }

    /// 部屋ごとの既定年齢層
    pub fn room_default(&self, room: Option<&str>) -> Option<&str> {
        let from_table = room.and_then(|room| {
            self.room_defaults
                .iter()
                .find(|(rooms, _)| rooms.iter().any(|r| r == room))
                .map(|(_, label)| label.as_str())
        });

        from_table.or(self.catch_all.as_deref())
    }

    /// 年齢層を決める
    ///
    /// 年齢が取れない、またはどの区間にも入らない場合は部屋の既定値。
    /// それもなければ `missing_label`（"N/A"）。
    pub fn classify<S: AsRef<str>>(&self, age_fields: &[S], room: Option<&str>) -> String {
        Self::extract_age(age_fields)
            .and_then(|age| self.bracket_for(age))
            .or_else(|| self.room_default(room))
            .unwrap_or(self.missing_label.as_str())
            .to_string()
    }
}

/// チーム種別の判定器
#[derive(Debug, Clone)]
pub struct TeamTypeClassifier {
    table: TeamTypeTable,
}

impl TeamTypeClassifier {
    pub fn new(table: &TeamTypeTable) -> Self {
        Self { table: table.clone() }
    }

    pub fn classify(&self, room: Option<&str>, age_group: &str) -> String {
        let t = &self.table;
        let room = room.unwrap_or_default();
        let contains = |set: &[String]| set.iter().any(|r| r == room);

        let label = if contains(&t.always_kids) {
            &t.kids_label
        } else if contains(&t.always_grown_up) {
            &t.grown_up_label
        } else if contains(&t.conditional) {
            if t.child_brackets.iter().any(|b| b == age_group) {
                &t.kids_label
            } else {
                &t.grown_up_label
            }
        } else {
            &t.unknown_label
        };

        label.clone()
    }
}
