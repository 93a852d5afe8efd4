//! 単純な列のクリーニング（脱出時間・ヒント数・担当者）

use booking_etl_common::text::clean_text;

/// 脱出時間が解析できない場合の値
pub const MISSING_ESCAPE_TIME: &str = "-";

/// 脱出時間（`H:MM:SS` または `H:MM`）を分に変換
pub fn escape_minutes(raw: &str) -> Option<f64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    let numbers: Vec<u32> = parts
        .iter()
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    let (hours, minutes, seconds) = match numbers.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [h, m] => (*h, *m, 0),
        _ => return None,
    };
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    let total = hours as f64 * 60.0 + minutes as f64 + seconds as f64 / 60.0;
    Some((total * 100.0).round() / 100.0)
}

/// 脱出時間を分（小数2桁）の文字列にする
pub fn clean_escape_time(raw: &str) -> String {
    match escape_minutes(raw) {
        Some(minutes) if minutes.fract() == 0.0 => format!("{:.1}", minutes),
        Some(minutes) => format!("{}", minutes),
        None => MISSING_ESCAPE_TIME.to_string(),
    }
}

/// ヒント数を整数にする（解析できなければ0、小数は切り捨て）
pub fn clean_helps(raw: &str) -> i64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n.trunc() as i64)
        .unwrap_or(0)
}

/// 担当者名をクリーニングし、空欄を直前の値で埋める
pub fn clean_admin_column<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut last = String::new();

    values
        .iter()
        .map(|value| {
            let cleaned = clean_text(value.as_ref());
            if !cleaned.is_empty() {
                last = cleaned;
            }
            last.clone()
        })
        .collect()
}
