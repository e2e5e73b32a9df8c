// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 默认门户地址（申请记录页面）
const DEFAULT_PORTAL_URL: &str =
    "https://external.emiratesgroupcareers.com/en_US/careersmarketplace/ProfileJobApplications";

/// CI环境变量与配置键的映射
///
/// 这些变量名是CI部署的既有契约，存在时覆盖对应配置项
const CI_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("EMIRATES_USER", "portal.username"),
    ("EMIRATES_PASS", "portal.password"),
    ("EMAIL_FROM", "email.from"),
    ("EMAIL_TO", "email.to"),
    ("EMAIL_PASSWORD", "email.password"),
    ("SMTP_SERVER", "email.smtp_server"),
    ("SMTP_PORT", "email.smtp_port"),
    ("CHECK_TIMEOUT_MS", "portal.check_timeout_ms"),
];

/// 必填凭据项及其对应的环境变量名
const REQUIRED_CREDENTIALS: &[(&str, &str)] = &[
    ("portal.username", "EMIRATES_USER"),
    ("portal.password", "EMIRATES_PASS"),
    ("email.from", "EMAIL_FROM"),
    ("email.to", "EMAIL_TO"),
    ("email.password", "EMAIL_PASSWORD"),
];

/// 应用程序配置设置
///
/// 包含门户、邮件和监控循环的所有配置项
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// 门户配置
    pub portal: PortalSettings,
    /// 邮件配置
    pub email: EmailSettings,
    /// 监控配置
    pub monitor: MonitorSettings,
}

/// 门户配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct PortalSettings {
    /// 申请记录页面URL
    pub url: String,
    /// 门户登录用户名
    pub username: String,
    /// 门户登录密码
    pub password: String,
    /// 页面元素等待超时（毫秒）
    pub check_timeout_ms: u64,
    /// Cookie横幅等待时间（毫秒）
    pub cookie_wait_ms: u64,
}

/// 邮件配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    /// 发件人地址（同时作为SMTP登录名）
    pub from: String,
    /// 收件人地址
    pub to: String,
    /// SMTP密码（Gmail需使用App Password）
    pub password: String,
    /// SMTP服务器
    pub smtp_server: String,
    /// SMTP端口（465走隐式TLS，其余走STARTTLS）
    pub smtp_port: u16,
}

/// 监控配置设置
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorSettings {
    /// 检查间隔（秒）
    pub interval_secs: u64,
    /// 单周期超时（秒）
    pub cycle_timeout_secs: u64,
    /// 状态文件路径
    pub status_file: String,
    /// 周期内最大重试次数
    pub max_retries: u32,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从默认值、配置文件和环境变量分层加载，CI环境变量
    /// （EMIRATES_USER等）始终拥有最高优先级
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并通过校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let mut builder = Config::builder()
            // Default Portal settings
            .set_default("portal.url", DEFAULT_PORTAL_URL)?
            .set_default("portal.username", "")?
            .set_default("portal.password", "")?
            .set_default("portal.check_timeout_ms", 60_000)?
            .set_default("portal.cookie_wait_ms", 8_000)?
            // Default Email settings
            .set_default("email.from", "")?
            .set_default("email.to", "")?
            .set_default("email.password", "")?
            .set_default("email.smtp_server", "smtp.gmail.com")?
            .set_default("email.smtp_port", 465)?
            // Default Monitor settings
            .set_default("monitor.interval_secs", 1_800)?
            .set_default("monitor.cycle_timeout_secs", 300)?
            .set_default("monitor.status_file", "latest_status.txt")?
            .set_default("monitor.max_retries", 2)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("STATUSWATCH").separator("__"));

        // CI变量覆盖所有其他来源
        for (var, key) in CI_ENV_OVERRIDES {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.portal.url)
            .map_err(|e| ConfigError::Message(format!("Invalid portal URL: {}", e)))?;

        for (key, var) in REQUIRED_CREDENTIALS {
            let value = match *key {
                "portal.username" => &self.portal.username,
                "portal.password" => &self.portal.password,
                "email.from" => &self.email.from,
                "email.to" => &self.email.to,
                "email.password" => &self.email.password,
                _ => unreachable!(),
            };
            if value.is_empty() {
                return Err(ConfigError::Message(format!(
                    "Environment variable {} is required but missing.",
                    var
                )));
            }
        }

        Ok(())
    }
}
