//! テキスト正規化
//!
//! すべての分類器が使う前処理:
//! - 前後の空白除去
//! - 大文字化
//! - ダイアクリティカルマーク（š, ė, ą など）の除去

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^A-Z0-9 ]").unwrap();
}

/// 空白のみ（または空）の値か判定
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// 空白除去 → 大文字化 → ダイアクリティカルマーク除去（NFD分解）
pub fn normalize_text(text: &str) -> String {
    text.trim()
        .to_uppercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// スタッフ名用のクリーニング
///
/// NFKD分解後に `[A-Z0-9 ]` 以外を取り除く。
pub fn clean_text(text: &str) -> String {
    let folded: String = text
        .to_uppercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    NON_ALNUM_RE.replace_all(&folded, "").trim().to_string()
}

/// 文字列中の最初の整数トークンを取得
pub fn first_integer(text: &str) -> Option<u32> {
    integer_tokens(text).next()
}

/// 文字列中の整数トークン（ASCII数字の並び）を順に列挙
///
/// `u32` に収まらないトークンは `u32::MAX` に飽和させる。
pub fn integer_tokens(text: &str) -> impl Iterator<Item = u32> + '_ {
    lazy_static! {
        static ref DIGITS_RE: Regex = Regex::new(r"[0-9]+").unwrap();
    }

    // 数字のみなので失敗するのは桁あふれだけ
    DIGITS_RE
        .find_iter(text)
        .map(|m| m.as_str().parse::<u32>().unwrap_or(u32::MAX))
}
