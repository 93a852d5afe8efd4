use crate::error::{EtlError, Result};
use booking_etl_common::NormalizerTables;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 変換テーブルJSON（未設定なら組み込みプリセット）
    pub tables_path: Option<PathBuf>,
    /// 組み込みプリセット名
    pub preset: String,
    /// クリーニング済みファイル名の接頭辞
    pub output_prefix: String,
    /// `clean` の入力ファイルパターン
    pub file_pattern: String,
    /// XLSX抽出時の料金列
    pub price_column: String,
    /// XLSX抽出時の流入元列
    pub source_column: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| EtlError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("booking-etl").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            tables_path: None,
            preset: "city1".into(),
            output_prefix: "City1".into(),
            file_pattern: "combined_data_*.csv".into(),
            price_column: "Revenue".into(),
            source_column: "Source".into(),
        }
    }

    /// 変換テーブルを読み込む
    ///
    /// 優先順: 引数で指定したファイル → 設定のファイル → プリセット
    pub fn load_tables(&self, override_path: Option<&Path>) -> Result<NormalizerTables> {
        match override_path.or(self.tables_path.as_deref()) {
            Some(path) => {
                if !path.exists() {
                    return Err(EtlError::FileNotFound(path.display().to_string()));
                }
                Ok(NormalizerTables::from_file(path)?)
            }
            None => NormalizerTables::from_preset(&self.preset)
                .ok_or_else(|| EtlError::Config(format!("不明なプリセット: {}", self.preset))),
        }
    }

    pub fn set_tables_path(&mut self, path: PathBuf) -> Result<()> {
        if !path.exists() {
            return Err(EtlError::FileNotFound(path.display().to_string()));
        }
        // 保存前に妥当性を確認
        NormalizerTables::from_file(&path)?;
        self.tables_path = Some(path);
        self.save()
    }

    pub fn set_output_prefix(&mut self, prefix: String) -> Result<()> {
        if prefix.trim().is_empty() {
            return Err(EtlError::Config("接頭辞が空です".into()));
        }
        self.output_prefix = prefix;
        self.save()
    }
}
