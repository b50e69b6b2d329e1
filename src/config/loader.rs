//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 验证配置
    fn validate(&self, config: &Config) -> Result<()>;
}

/// TOML配置加载器实现
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// 创建新的TOML配置加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用 `${VAR}` 环境变量替换
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 解析TOML内容
    ///
    /// 先按TOML解析，再只在字符串值中替换 `${VAR}`，注释和键名不参与替换，
    /// 变量值原样写入，不会改变文档结构
    fn parse_toml(&self, content: &str) -> Result<Config> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;
        let mut document = toml::Value::Table(table);

        if self.enable_env_substitution {
            let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
                .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;
            substitute_env_vars(&pattern, &mut document)?;
        }

        let config: Config = document
            .try_into()
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;

        Ok(config)
    }
}

/// 递归替换所有字符串值中的环境变量
fn substitute_env_vars(pattern: &Regex, value: &mut toml::Value) -> Result<()> {
    match value {
        toml::Value::String(text) => {
            if pattern.is_match(text) {
                *text = expand(pattern, text)?;
            }
        }
        toml::Value::Array(items) => {
            for item in items {
                substitute_env_vars(pattern, item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                substitute_env_vars(pattern, item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// 展开单个字符串中的 `${VAR}`，变量缺失时报错
fn expand(pattern: &Regex, text: &str) -> Result<String> {
    let mut expanded = String::with_capacity(text.len());
    let mut last = 0;

    for captures in pattern.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let var_name = &captures[1];
        let value = std::env::var(var_name).map_err(|_| ConfigError::EnvVarError {
            var: var_name.to_string(),
        })?;

        expanded.push_str(&text[last..whole.start()]);
        expanded.push_str(&value);
        last = whole.end();
    }

    expanded.push_str(&text[last..]);
    Ok(expanded)
}

impl Default for TomlConfigLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;

        let config = self.parse_toml(&content)?;
        self.validate(&config)?;

        log::info!("成功加载配置文件: {}", path.display());
        log::debug!("配置内容: {:?}", config);

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        let config = self.parse_toml(content)?;
        self.validate(&config)?;

        log::debug!("成功解析配置字符串");

        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(Into::into)
    }
}

/// 获取默认配置文件路径
///
/// 当前目录存在 `pinger.toml` 时优先使用，否则为用户配置目录下的 `pinger/pinger.toml`
pub fn get_default_config_path() -> PathBuf {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|config_dir| config_dir.join("pinger").join(DEFAULT_CONFIG_FILE))
        .unwrap_or(local)
}

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "pinger.toml";
