// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::PortalSettings;
use crate::domain::models::status::StatusSnapshot;
use crate::engines::traits::{EngineError, StatusProbe};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// 申请记录标签页选择器（区块头部的第二个标签）
const APPLICATION_TAB: &str = "#main-panel > section > div.section__header.section__header--tabs > div > ul > li:nth-child(2) > a";
/// 状态单元格选择器（申请表格第二行第二列）
const STATUS_CELL: &str = "#main-panel > section > div.section__content > article > div > div > table > tbody > tr:nth-child(2) > td:nth-child(2)";
/// OneTrust Cookie横幅接受按钮
const COOKIE_ACCEPT: &str = "#onetrust-accept-btn-handler";
/// 登录按钮
const LOGIN_BUTTON: &str = "#login";
/// 用户名输入框
const USERNAME_INPUT: &str = "input[name=\"username\"]";
/// 密码输入框
const PASSWORD_INPUT: &str = "input[name=\"password\"]";

/// 元素轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Cookie横幅消失等待上限
const COOKIE_DETACH_WAIT: Duration = Duration::from_secs(5);
/// 页面交互后的稳定等待
const SETTLE_WAIT: Duration = Duration::from_secs(2);

// Global browser instance to avoid re-launching Chrome on every cycle.
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

// Asynchronously gets or initializes the shared browser instance.
// This function ensures that the browser is launched only once.
pub async fn get_browser() -> Result<&'static Browser, EngineError> {
    BROWSER_INSTANCE
        .get_or_try_init(|| async {
            let remote_debugging_url = std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok();

            let (browser, mut handler) = if let Some(ref url) = remote_debugging_url {
                tracing::info!("Connecting to remote Chrome instance at: {}", url);
                Browser::connect(url).await.map_err(|e| {
                    EngineError::Browser(format!("Failed to connect to remote Chrome: {}", e))
                })?
            } else {
                let mut builder = BrowserConfig::builder()
                    .no_sandbox()
                    .request_timeout(Duration::from_secs(30));

                // CI runner environment setup
                builder = builder.arg("--disable-gpu").arg("--disable-dev-shm-usage");

                Browser::launch(
                    builder
                        .build()
                        .map_err(|e| EngineError::Browser(e.to_string()))?,
                )
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?
            };

            // Spawn a handler to process browser events
            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        })
        .await
}

/// 浏览器探测引擎
///
/// 基于chromiumoxide实现的门户状态探测引擎，负责登录门户、
/// 打开申请记录标签页并读取状态单元格
pub struct BrowserProbe {
    /// 门户配置
    portal: PortalSettings,
}

impl BrowserProbe {
    /// 创建新的浏览器探测引擎实例
    pub fn new(portal: PortalSettings) -> Self {
        Self { portal }
    }

    fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.portal.check_timeout_ms)
    }

    /// 轮询等待元素出现
    ///
    /// # 参数
    ///
    /// * `page` - 目标页面
    /// * `selector` - CSS选择器
    /// * `timeout` - 等待上限
    ///
    /// # 返回值
    ///
    /// * `Ok(chromiumoxide::Element)` - 找到的元素
    /// * `Err(EngineError::Timeout)` - 等待超时
    async fn wait_for_element(
        page: &Page,
        selector: &str,
        timeout: Duration,
    ) -> Result<chromiumoxide::Element, EngineError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(element) = page.find_element(selector).await {
                return Ok(element);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(EngineError::Timeout);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// 判断元素当前是否存在于页面中
    async fn has_element(page: &Page, selector: &str) -> bool {
        page.find_element(selector).await.is_ok()
    }

    /// 关闭Cookie同意横幅
    ///
    /// 等待OneTrust横幅出现并点击接受，横幅缺失不是错误
    async fn dismiss_cookie_banner(&self, page: &Page) {
        let wait = Duration::from_millis(self.portal.cookie_wait_ms);
        match Self::wait_for_element(page, COOKIE_ACCEPT, wait).await {
            Ok(element) => {
                if let Err(e) = element.click().await {
                    warn!("Cookie banner click failed: {}", e);
                    return;
                }
                // 等待横幅从DOM中移除，避免遮挡登录按钮
                let deadline = tokio::time::Instant::now() + COOKIE_DETACH_WAIT;
                while Self::has_element(page, COOKIE_ACCEPT).await {
                    if tokio::time::Instant::now() >= deadline {
                        warn!("Cookie banner still attached after accept");
                        break;
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
            Err(_) => debug!("No cookie banner within {:?}", wait),
        }
    }

    /// 点击登录按钮
    ///
    /// 依次尝试ID选择器与按文本查找的兜底方案
    async fn click_login(&self, page: &Page) -> Result<(), EngineError> {
        self.dismiss_cookie_banner(page).await;

        if let Ok(element) = page.find_element(LOGIN_BUTTON).await {
            return element
                .click()
                .await
                .map(|_| ())
                .map_err(|e| EngineError::Browser(format!("Login click failed: {}", e)));
        }

        // Fallback: locate the login control by its text content
        let script = r#"
            (() => {
                const candidates = [...document.querySelectorAll('button, a, input[type=submit]')];
                const target = candidates.find(el =>
                    (el.textContent || el.value || '').trim().toLowerCase() === 'log in');
                if (target) { target.click(); return true; }
                return false;
            })()
        "#;
        let clicked = page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Browser(format!("Login fallback script failed: {}", e)))?
            .into_value::<bool>()
            .unwrap_or(false);

        if clicked {
            Ok(())
        } else {
            Err(EngineError::LoginFailed(
                "Login button not found - update selectors".to_string(),
            ))
        }
    }

    /// 在登录表单中填入凭据并提交
    async fn login(&self, page: &Page) -> Result<(), EngineError> {
        debug!("Login form detected, authenticating");

        let username = page
            .find_element(USERNAME_INPUT)
            .await
            .map_err(|e| EngineError::Browser(format!("Username field lost: {}", e)))?;
        username
            .click()
            .await
            .map_err(|e| EngineError::Browser(format!("Username focus failed: {}", e)))?;
        username
            .type_str(&self.portal.username)
            .await
            .map_err(|e| EngineError::Browser(format!("Username input failed: {}", e)))?;

        let password = page
            .find_element(PASSWORD_INPUT)
            .await
            .map_err(|e| EngineError::Browser(format!("Password field not found: {}", e)))?;
        password
            .click()
            .await
            .map_err(|e| EngineError::Browser(format!("Password focus failed: {}", e)))?;
        password
            .type_str(&self.portal.password)
            .await
            .map_err(|e| EngineError::Browser(format!("Password input failed: {}", e)))?;

        self.click_login(page).await?;

        // 登录跳转后的稳定等待，真正的就绪判定由后续标签页等待完成
        tokio::time::sleep(SETTLE_WAIT).await;
        Ok(())
    }

    /// 读取状态单元格文本
    ///
    /// 直接元素读取失败时，退回到解析整页HTML提取同一单元格
    async fn read_status_cell(&self, page: &Page) -> Option<String> {
        match Self::wait_for_element(page, STATUS_CELL, self.check_timeout()).await {
            Ok(element) => match element.inner_text().await {
                Ok(Some(text)) => return Some(text),
                Ok(None) => return Some(String::new()),
                Err(e) => warn!("Status cell read failed, falling back to HTML: {}", e),
            },
            Err(_) => warn!("Status cell not found within timeout, falling back to HTML"),
        }

        match page.content().await {
            Ok(html) => extract_status_from_html(&html),
            Err(e) => {
                warn!("Page content unavailable: {}", e);
                None
            }
        }
    }
}

/// 从整页HTML中提取状态单元格文本
///
/// # 参数
///
/// * `html` - 页面HTML
///
/// # 返回值
///
/// 单元格文本（去除首尾空白），未命中时返回None
pub fn extract_status_from_html(html: &str) -> Option<String> {
    let document = scraper::Html::parse_document(html);
    let selector = scraper::Selector::parse(STATUS_CELL).ok()?;
    document
        .select(&selector)
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
}

#[async_trait]
impl StatusProbe for BrowserProbe {
    /// 执行一次门户状态观测
    ///
    /// # 返回值
    ///
    /// * `Ok(StatusSnapshot)` - 观测到的状态快照（单元格不可读时值为空）
    /// * `Err(EngineError)` - 浏览器或登录失败
    async fn probe(&self) -> Result<StatusSnapshot, EngineError> {
        let browser = get_browser().await?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        let result = self.probe_on_page(&page).await;

        // Close the page but keep the shared browser for the next cycle
        if let Err(e) = page.close().await {
            warn!("Page close failed: {}", e);
        }

        result
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

impl BrowserProbe {
    async fn probe_on_page(&self, page: &Page) -> Result<StatusSnapshot, EngineError> {
        // 页面加载超时不直接失败，后续的元素等待决定观测结果
        match tokio::time::timeout(self.check_timeout(), page.goto(&self.portal.url)).await {
            Err(_) => warn!("Page load timed out"),
            Ok(Err(e)) => warn!("Page load failed: {}", e),
            Ok(Ok(_)) => {}
        }

        if Self::has_element(page, USERNAME_INPUT).await {
            self.login(page).await?;
        }

        match Self::wait_for_element(page, APPLICATION_TAB, self.check_timeout()).await {
            Ok(tab) => {
                tab.click()
                    .await
                    .map_err(|e| EngineError::Browser(format!("Tab click failed: {}", e)))?;
                tokio::time::sleep(SETTLE_WAIT).await;
            }
            Err(_) => warn!("Applications tab not found within timeout"),
        }

        let value = self.read_status_cell(page).await.unwrap_or_default();
        Ok(StatusSnapshot::new(value))
    }
}
