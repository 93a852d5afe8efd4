use anyhow::Context;
use booking_etl::normalizer::Normalizer;
use booking_etl::pipeline::{self, CleanOptions, CleanOutcome, FileStatus};
use booking_etl::sheet::xlsx::{self, ExtractOptions};
use booking_etl::{cli, config, error, logging, merge, scanner};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::configure_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Extract { input, output, price_column, source_column } => {
            println!("📄 booking-etl - XLSX抽出\n");

            let output_dir = output.unwrap_or_else(|| {
                input
                    .parent()
                    .unwrap_or(std::path::Path::new("."))
                    .join("extracted_data")
            });
            let options = ExtractOptions {
                price_column: price_column.unwrap_or_else(|| config.price_column.clone()),
                source_column: source_column.unwrap_or_else(|| config.source_column.clone()),
            };

            println!("[1/1] シートを抽出中...");
            let sheets = xlsx::extract_workbook(&input, &output_dir, &options)
                .with_context(|| format!("抽出に失敗: {}", input.display()))?;
            println!("✔ {}シートを抽出", sheets.len());

            println!("\n✅ 抽出完了");
        }

        Commands::Combine { input, manifest, output } => {
            println!("🗂  booking-etl - 年別結合\n");

            let manifest = merge::load_manifest(&manifest)?;
            let output_dir = output.unwrap_or_else(|| input.clone());

            println!("[1/1] {}年分を結合中...", manifest.len());
            let reports = merge::combine_yearly(&input, &manifest, &output_dir)?;
            for report in &reports {
                if report.rows == 0 {
                    println!("  ⚠ {}: データなし（空ファイルを作成）", report.year);
                } else {
                    println!("  ✔ {}: {}行 → {}", report.year, report.rows, report.output.display());
                }
                if !report.missing.is_empty() {
                    println!("    欠落: {}", report.missing.join(", "));
                }
            }

            println!("\n✅ 結合完了");
        }

        Commands::Clean { input, output, pattern, tables, merged, format, prefix } => {
            println!("🧹 booking-etl - クリーニング\n");

            // 1. テーブル
            println!("[1/3] 変換テーブルを読み込み中...");
            let tables = config.load_tables(tables.as_deref())?;
            let normalizer = Normalizer::new(&tables)?;
            println!("✔ 変換テーブル準備完了\n");

            // 2. ファイル検出
            println!("[2/3] ファイルをスキャン中...");
            let pattern = pattern.unwrap_or_else(|| config.file_pattern.clone());
            let files = scanner::scan_folder(&input, &pattern)?;
            println!("✔ {}件のファイルを検出\n", files.len());

            if files.is_empty() {
                println!("パターンに一致するファイルがありません: {}", pattern);
                return Ok(());
            }

            // 3. クリーニング
            println!("[3/3] クリーニング中...");
            let output_dir = output.unwrap_or_else(|| input.join("cleaned"));
            let options = CleanOptions {
                prefix: prefix.unwrap_or_else(|| config.output_prefix.clone()),
                format: format.clone(),
            };
            let results = pipeline::clean_files(&normalizer, &files, &output_dir, &options, !cli.verbose);

            let mut outcomes: Vec<&CleanOutcome> = Vec::new();
            let mut failures = 0;
            for (file, result) in &results {
                let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                match result {
                    Ok(FileStatus::Cleaned(outcome)) => {
                        println!(
                            "  ✔ {} ({}年): {}行 → {}行",
                            name,
                            outcome.year,
                            outcome.stats.total_records,
                            outcome.stats.kept_records
                        );
                        outcomes.push(outcome);
                    }
                    Ok(FileStatus::Skipped { reason, .. }) => println!("  - {}: スキップ（{}）", name, reason),
                    Err(e) => {
                        failures += 1;
                        println!("  ✖ {}: {}", name, e);
                    }
                }
            }

            if let Some(merged_path) = merged {
                if outcomes.is_empty() {
                    println!("\nまとめるファイルがありません");
                } else {
                    let (rows, written) = pipeline::write_merged(&outcomes, &format, &merged_path)?;
                    for path in written {
                        println!("✔ 全年まとめ: {}行 → {}", rows, path.display());
                    }
                }
            }

            if failures > 0 {
                println!("\n⚠ {}件のファイルでエラーが発生しました", failures);
            }
            println!("\n✅ クリーニング完了");
        }

        Commands::Merge { first, second, output, rare_threshold, first_name, second_name } => {
            println!("🔗 booking-etl - 2拠点統合\n");

            let options = merge::CityMergeOptions {
                city_names: (first_name, second_name),
                rare_threshold,
            };
            let report = merge::merge_cities(&first, &second, &output, &options)?;
            println!("✔ {}行（重複 {}行を削除）", report.rows, report.duplicates);
            println!("✔ 統合データ: {}", output.display());

            println!("\n✅ 統合完了");
        }

        Commands::Tables { dump, tables } => {
            let tables = config.load_tables(tables.as_deref())?;
            let json = tables.to_json().map_err(error::EtlError::from)?;

            match dump {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✔ 変換テーブルを書き出しました: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Config { set_tables, set_prefix, show } => {
            let mut config = config;

            if let Some(path) = set_tables {
                config.set_tables_path(path)?;
                println!("✔ 変換テーブルを設定しました");
            }

            if let Some(prefix) = set_prefix {
                config.set_output_prefix(prefix)?;
                println!("✔ 接頭辞を設定しました");
            }

            if show {
                let tables = config
                    .tables_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| format!("(プリセット: {})", config.preset));
                println!("設定:");
                println!("  設定ファイル: {}", Config::config_path()?.display());
                println!("  変換テーブル: {}", tables);
                println!("  接頭辞: {}", config.output_prefix);
                println!("  ファイルパターン: {}", config.file_pattern);
                println!("  料金列: {}", config.price_column);
                println!("  流入元列: {}", config.source_column);
            }
        }
    }

    Ok(())
}
