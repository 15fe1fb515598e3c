use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nimbus_config::{
    ClusterConfig, ConfigValidator, ConfigValue, ConfigurationStore, ProfileRegistry,
    DEFAULT_PROFILE,
};
use nimbus_observability::LogFormat;
use tracing::{debug, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "nimbus-config")]
#[command(version)]
#[command(about = "nimbus 仿真集群启动配置查看工具")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 配置档案，可重复指定，按顺序叠加
    #[arg(short, long = "profile", value_name = "NAME", global = true)]
    pub profiles: Vec<String>,

    /// TOML 覆盖文件，在档案之后按顺序应用
    #[arg(short, long = "overlay", value_name = "FILE", global = true)]
    pub overlays: Vec<PathBuf>,

    /// 读取 NIMBUS_<KEY> 环境变量覆盖
    #[arg(long, global = true)]
    pub env_overrides: bool,

    /// 日志级别
    #[arg(
        short = 'l',
        long,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        global = true
    )]
    pub log_level: String,

    /// 日志格式
    #[arg(
        long,
        value_name = "FORMAT",
        value_enum,
        default_value_t = LogFormatArg::Compact,
        global = true
    )]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 显示完整配置
    Show {
        /// 输出格式
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// 读取单个配置项
    Get {
        /// 配置项名称，例如 FIRST_PORT
        key: String,
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
    /// 验证配置
    Validate,
    /// 列出可用配置档案
    Profiles,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// 扁平 JSON，null 表示已禁用
    Json,
    /// 扁平 TOML，禁用项列在 disabled 中
    Toml,
    /// 按类别分组的 JSON
    Sections,
}

/// 日志输出格式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Json,
    Pretty,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

/// 根据命令行参数构建配置
pub fn build_store(cli: &Cli) -> Result<ConfigurationStore> {
    let mut builder = ConfigurationStore::builder();
    for profile in &cli.profiles {
        builder = builder.profile(profile);
    }
    for path in &cli.overlays {
        builder = builder
            .overlay_file(path)
            .with_context(|| format!("加载覆盖文件失败: {}", path.display()))?;
    }
    if cli.env_overrides {
        builder = builder.env_overrides().context("解析环境变量覆盖失败")?;
    }

    builder.build().context("构建配置失败")
}

/// 执行命令，返回要输出到标准输出的内容
pub fn execute(cli: &Cli) -> Result<String> {
    debug!("执行命令: {:?}", cli.command);

    if let Commands::Profiles = cli.command {
        return Ok(list_profiles(&ProfileRegistry::default()));
    }

    let store = build_store(cli)?;
    match &cli.command {
        Commands::Show { format } => match format {
            OutputFormat::Json => Ok(store.to_json()?),
            OutputFormat::Toml => Ok(store.to_toml()?),
            OutputFormat::Sections => {
                let cluster = ClusterConfig::from_store(&store).context("读取分组配置失败")?;
                Ok(cluster.to_json()?)
            }
        },
        Commands::Get { key, json } => {
            let value = store
                .get_value(key)
                .with_context(|| format!("读取配置项失败: {key}"))?;
            if *json {
                return Ok(serde_json::to_string(&value)?);
            }
            Ok(match value {
                ConfigValue::Str(s) => s,
                other => other.to_string(),
            })
        }
        Commands::Validate => {
            let cluster = ClusterConfig::from_store(&store).context("读取分组配置失败")?;
            cluster.validate().context("配置验证失败")?;
            info!("配置验证通过");
            Ok(format!(
                "✓ 配置验证通过: 档案 {}, 配置项 {}, 实例数 {}",
                store.profiles().join("+"),
                store.keys().len(),
                cluster.deployment.instance_num()
            ))
        }
        Commands::Profiles => Ok(list_profiles(&ProfileRegistry::default())),
    }
}

fn list_profiles(registry: &ProfileRegistry) -> String {
    let mut lines = Vec::new();
    for name in registry.list_profiles() {
        let description = registry
            .get_profile(name)
            .map(|profile| profile.description.as_str())
            .unwrap_or_default();
        let marker = if name == DEFAULT_PROFILE { "*" } else { " " };
        lines.push(format!("{marker} {name:<16} {description}"));
    }
    lines.join("\n")
}
