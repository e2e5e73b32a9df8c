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

use clap::{Parser, Subcommand};
use statuswatch::config::settings::Settings;
use statuswatch::domain::models::status::CheckOutcome;
use statuswatch::domain::services::monitor_service::MonitorService;
use statuswatch::engines::browser_probe::BrowserProbe;
use statuswatch::engines::health_monitor::PortalHealthMonitor;
use statuswatch::infrastructure::repositories::file_status_repo_impl::FileStatusRepository;
use statuswatch::infrastructure::services::email_notifier_impl::EmailNotifier;
use statuswatch::utils::telemetry;
use statuswatch::workers::monitor_worker::MonitorWorker;
use statuswatch::workers::Worker;
use std::sync::Arc;
use tracing::info;

/// 门户申请状态监控器
#[derive(Parser)]
#[command(name = "statuswatch", version, about = "Portal application status monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 持续运行监控循环
    Run,
    /// 执行单次检查（手动触发的对应物），退出码反映检查结果
    Check {
        /// 以JSON格式输出检查报告
        #[arg(long)]
        json: bool,
    },
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并按子命令运行
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env支持本地开发，CI环境直接注入变量
    dotenvy::dotenv().ok();

    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting statuswatch...");

    let cli = Cli::parse();

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Initialize Components
    let repository = Arc::new(FileStatusRepository::new(&settings.monitor.status_file));
    let probe = Arc::new(BrowserProbe::new(settings.portal.clone()));
    let notifier = Arc::new(EmailNotifier::new(settings.email.clone()));
    let service = Arc::new(MonitorService::new(probe, repository, notifier));
    let health = Arc::new(PortalHealthMonitor::new(settings.portal.url.clone()));

    let worker = MonitorWorker::new(service, health, &settings.monitor);

    match cli.command {
        Commands::Run => {
            worker.run().await?;
        }
        Commands::Check { json } => {
            let report = worker.run_once().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                match &report.outcome {
                    CheckOutcome::Changed(change) => println!("Status changed: {}", change),
                    CheckOutcome::Unchanged => println!("No change detected."),
                }
            }
        }
    }

    Ok(())
}
