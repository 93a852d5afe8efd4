use std::io;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// ログ出力の初期化
///
/// 進捗表示は標準出力に出すため、ログは標準エラーに出す。
/// `RUST_LOG` が設定されていればそれを優先する。
pub fn configure_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(filter);

    // テストや二重呼び出しでの再初期化は無視
    let _ = tracing_subscriber::registry().with(stderr_log).try_init();
}
