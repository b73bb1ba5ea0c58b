//! apicompat - API 兼容性校验工具
//!
//! 标准输出每行一条未被抑制的差异，日志写到标准错误。
//! 退出码：0 表示兼容，1 表示存在差异，2 表示致命错误。

mod cli;

use apicompat_core::{Result, SurfaceFileProvider, ValidationOutcome, validate};
use cli::{Cli, Config};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_DIFFERENCES: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    // 解析命令行参数
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    // 验证参数
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        return ExitCode::from(EXIT_FATAL);
    }

    let config: Config = cli.into();
    debug!("Configuration: {:?}", config);

    match run(&config) {
        Ok(outcome) => report(&outcome),
        Err(e) => {
            error!("Application error: {}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// 初始化日志记录，`RUST_LOG` 优先
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 主要应用逻辑
fn run(config: &Config) -> Result<ValidationOutcome> {
    info!(
        "Validating {} left inputs against {} right inputs",
        config.left.len(),
        config.right.len()
    );
    validate(&config.to_validation_options(), Arc::new(SurfaceFileProvider::new()))
}

fn report(outcome: &ValidationOutcome) -> ExitCode {
    for unresolved in &outcome.unresolved {
        warn!(
            "CP1002 {} reference '{}' of {} could not be resolved",
            unresolved.side, unresolved.unresolved, unresolved.assembly
        );
    }

    for difference in &outcome.differences {
        println!("{difference}");
    }

    if outcome.is_success() {
        info!("API compatibility check passed");
        ExitCode::SUCCESS
    } else {
        error!(
            "API compatibility check failed with {} differences",
            outcome.differences.len()
        );
        ExitCode::from(EXIT_DIFFERENCES)
    }
}
