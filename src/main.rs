use anyhow::{Context, Result};
use clap::Parser;
use nimbus::app::{self, Cli};
use nimbus_observability::{init_logging, LoggingConfig};

fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 初始化日志系统
    let mut logging = LoggingConfig::new(cli.log_level.as_str(), cli.log_format.into());
    logging.include_location = false;
    init_logging(&logging).context("初始化日志系统失败")?;

    let output = app::execute(&cli)?;
    println!("{output}");

    Ok(())
}
