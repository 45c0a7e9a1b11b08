//! # 交互式文本菜单
//!
//! 在终端中通过编号菜单管理收藏清单，与 HTTP 接口共用同一套服务层逻辑。
//!
//! 菜单对输入输出做了泛化（`AsyncBufRead` + `AsyncWrite`），
//! 运行时接标准输入输出，测试时接内存缓冲区。
//!
//! 每个菜单项内部的错误只会打印出来并回到主菜单，不会结束程序；
//! 输入流结束（EOF）视为取消当前操作，在主菜单处则退出。

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, AppResult};
use crate::models::stats::CountEntry;
use crate::services::collection::{self, MODEL_NAME_COLUMN, SERIES_COLUMN};
use crate::services::export::{self, ExportFormat};
use crate::services::state::AppState;
use crate::services::{file_guard, search, statistics};

/// 搜索结果最多显示的条数
const SEARCH_DISPLAY_LIMIT: usize = 20;

const RULE: &str = "------------------------------------------------------------";

const MAIN_MENU: &str = "\
主菜单
------------------------------------------------------------
1. 添加车型
2. 搜索车型
3. 查看统计
4. 添加字段
5. 修改车型
6. 删除车型
7. 导出收藏清单
8. 帮助
9. 退出
------------------------------------------------------------";

pub struct Menu<'a, R, W> {
    state: &'a AppState,
    input: R,
    output: W,
}

impl<'a, R, W> Menu<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(state: &'a AppState, input: R, output: W) -> Self {
        Self {
            state,
            input,
            output,
        }
    }

    /// 主循环：选择 9 或输入结束时返回
    pub async fn run(&mut self) -> AppResult<()> {
        self.say("============================================================").await?;
        self.say("  DieCast Tracker - Hot Wheels 收藏管理").await?;
        self.say("============================================================").await?;

        loop {
            self.say(&format!("\n{}", MAIN_MENU)).await?;
            let Some(choice) = self.prompt("请选择 (1-9): ").await? else {
                break;
            };

            let result = match choice.as_str() {
                "1" => self.add_model().await,
                "2" => self.search_models().await,
                "3" => self.show_statistics().await,
                "4" => self.add_field().await,
                "5" => self.update_model().await,
                "6" => self.delete_model().await,
                "7" => self.export_collection().await,
                "8" => self.show_help().await,
                "9" => {
                    self.say("\n感谢使用 DieCast Tracker，收藏愉快！").await?;
                    break;
                }
                _ => Err(AppError::validation("无效的选择，请输入 1 到 9 之间的数字")),
            };

            if let Err(e) = result {
                log::debug!("菜单操作失败: {}", e);
                self.say(&format!("\n[错误] {}", e)).await?;
            }
        }
        Ok(())
    }

    async fn say(&mut self, text: &str) -> AppResult<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    /// 输出提示并读取一行（去除首尾空白），输入结束时返回 `None`
    async fn prompt(&mut self, label: &str) -> AppResult<Option<String>> {
        self.output.write_all(label.as_bytes()).await?;
        self.output.flush().await?;
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// 读取编号，解析失败为校验错误
    async fn prompt_number(&mut self, label: &str) -> AppResult<Option<u64>> {
        let Some(text) = self.prompt(label).await? else {
            return Ok(None);
        };
        text.parse()
            .map(Some)
            .map_err(|_| AppError::validation(format!("无效的编号: '{}'", text)))
    }

    /// 从列表中按序号选择一项（序号从 1 开始）
    async fn choose(&mut self, title: &str, options: &[String]) -> AppResult<Option<String>> {
        self.say(&format!("\n{}", title)).await?;
        for (i, option) in options.iter().enumerate() {
            self.say(&format!("  {}. {}", i + 1, option)).await?;
        }
        let Some(choice) = self.prompt_number(&format!("请选择 (1-{}): ", options.len())).await? else {
            return Ok(None);
        };
        let picked = usize::try_from(choice)
            .ok()
            .and_then(|c| c.checked_sub(1))
            .and_then(|i| options.get(i));
        match picked {
            Some(option) => Ok(Some(option.clone())),
            None => Err(AppError::validation(format!("无效的选择: {}", choice))),
        }
    }

    async fn confirm(&mut self, label: &str) -> AppResult<bool> {
        let answer = self.prompt(label).await?.unwrap_or_default().to_lowercase();
        Ok(answer == "yes" || answer == "y")
    }

    /// 1. 添加车型
    ///
    /// 支持快捷输入 `车型名#主子`（两位序号），否则逐级选择主系列和子系列。
    async fn add_model(&mut self) -> AppResult<()> {
        self.say(&format!("\n添加车型\n{}", RULE)).await?;
        let Some(input) = self
            .prompt("车型名称（可用 名称#12 快捷选择系列）: ")
            .await?
        else {
            return Ok(());
        };

        let catalog = self.state.catalog();
        let shortcut = catalog.parse_shortcut(&input);
        if shortcut.model_name.is_empty() {
            return Err(AppError::validation("车型名称不能为空"));
        }

        let (main_series, subseries) = match shortcut.selection {
            Some(selection) => {
                self.say(&format!("已选择: {} / {}", selection.0, selection.1)).await?;
                selection
            }
            None => {
                let mains: Vec<String> = catalog
                    .main_series_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let Some(main) = self.choose("选择主系列:", &mains).await? else {
                    return Ok(());
                };
                let subs = catalog.subseries_of(&main).to_vec();
                let Some(sub) = self
                    .choose(&format!("选择 '{}' 的子系列:", main), &subs)
                    .await?
                else {
                    return Ok(());
                };
                (main, sub)
            }
        };

        let id = collection::add_model(self.state, &shortcut.model_name, &main_series, &subseries).await?;
        self.say(&format!(
            "\n[成功] 已添加车型 '{}'，编号 {}",
            shortcut.model_name, id
        ))
        .await
    }

    /// 2. 搜索车型（最多显示前 20 条）
    async fn search_models(&mut self) -> AppResult<()> {
        self.say(&format!("\n搜索车型\n{}", RULE)).await?;
        let Some(query) = self.prompt("搜索关键字（留空显示全部）: ").await? else {
            return Ok(());
        };

        let table = collection::load_collection(self.state).await?;
        let hits = search::search_records(&table, &query);
        if hits.is_empty() {
            return self.say("\n没有找到匹配的车型。").await;
        }

        self.say(&format!("\n找到 {} 个车型:\n{}", hits.len(), RULE)).await?;
        for record in hits.iter().take(SEARCH_DISPLAY_LIMIT) {
            let name = table.field(record, MODEL_NAME_COLUMN).unwrap_or("N/A");
            let series = table.field(record, SERIES_COLUMN).unwrap_or("N/A");
            self.say(&format!("  #{}: {} [{}]", record.id, name, series)).await?;
        }
        if hits.len() > SEARCH_DISPLAY_LIMIT {
            self.say(&format!("\n  ... 另有 {} 条结果", hits.len() - SEARCH_DISPLAY_LIMIT))
                .await?;
        }
        Ok(())
    }

    /// 3. 查看统计
    async fn show_statistics(&mut self) -> AppResult<()> {
        self.say(&format!("\n收藏统计\n{}", RULE)).await?;
        let table = collection::load_collection(self.state).await?;
        let stats = statistics::collection_stats(&table, &self.state.catalog());

        self.say(&format!("\n车型总数: {}", stats.total_models)).await?;

        if !stats.main_series_breakdown.is_empty() {
            self.say("\n主系列分布:").await?;
            for entry in &stats.main_series_breakdown {
                self.say(&breakdown_line(entry, 20, true)).await?;
            }
        }
        if !stats.series_breakdown.is_empty() {
            self.say("\n子系列排行:").await?;
            for entry in stats.series_breakdown.iter().take(10) {
                self.say(&breakdown_line(entry, 30, false)).await?;
            }
        }

        let goals = &stats.collection_goals;
        if let Some(next) = goals.next_milestone {
            self.say(&format!(
                "\n下一个里程碑: {} 个车型\n   进度: {}/{} ({:.1}%)\n   还差 {} 个！",
                next,
                goals.current_count,
                next,
                goals.progress_percentage,
                next.saturating_sub(goals.current_count)
            ))
            .await?;
        }

        if !stats.recent_additions.is_empty() {
            self.say("\n最近添加（最新 5 个）:").await?;
            for model in stats.recent_additions.iter().take(5) {
                let text = |key: &str| {
                    model
                        .get(key)
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .unwrap_or_else(|| "N/A".to_string())
                };
                let serial = table.columns.first().map(|c| text(c)).unwrap_or_default();
                self.say(&format!(
                    "  #{}: {} [{}]",
                    serial,
                    text(MODEL_NAME_COLUMN),
                    text(SERIES_COLUMN)
                ))
                .await?;
            }
        }

        let insights = &stats.collection_insights;
        if let Some(score) = insights.diversity_score {
            self.say(&format!("\n收藏洞察:\n   多样性得分: {:.1}%", score)).await?;
        }
        if let Some(coverage) = &insights.series_coverage {
            self.say(&format!(
                "   系列覆盖: {}/{} ({:.1}%)",
                coverage.covered, coverage.total, coverage.percentage
            ))
            .await?;
        }
        Ok(())
    }

    /// 4. 添加字段
    async fn add_field(&mut self) -> AppResult<()> {
        self.say(&format!("\n添加字段\n{}", RULE)).await?;
        let Some(name) = self.prompt("字段名称: ").await? else {
            return Ok(());
        };
        if name.is_empty() {
            return Err(AppError::validation("字段名称不能为空"));
        }
        collection::add_field(self.state, &name).await?;
        self.say(&format!("\n[成功] 已新增字段 '{}'", name)).await
    }

    /// 5. 修改车型：逐个字段输入新值，留空表示不修改
    async fn update_model(&mut self) -> AppResult<()> {
        self.say(&format!("\n修改车型\n{}", RULE)).await?;
        let Some(id) = self.prompt_number("要修改的编号: ").await? else {
            return Ok(());
        };

        let table = collection::load_collection(self.state).await?;
        let record = table
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("编号 {} 的车型不存在", id)))?;

        self.say("\n当前信息:").await?;
        self.say(&format!("  {}: {}", table.columns[0], record.id)).await?;
        for (column, value) in table.columns.iter().skip(1).zip(&record.fields) {
            self.say(&format!("  {}: {}", column, value)).await?;
        }

        self.say("\n输入新值（留空跳过）:").await?;
        let mut updates = Vec::new();
        for (column, value) in table.columns.iter().skip(1).zip(&record.fields) {
            let Some(new_value) = self
                .prompt(&format!("  {}（当前: {}）: ", column, value))
                .await?
            else {
                return Ok(());
            };
            if !new_value.is_empty() {
                updates.push((column.clone(), new_value));
            }
        }

        if updates.is_empty() {
            return self.say("\n[提示] 没有输入任何修改。").await;
        }
        if !self.confirm(&format!("\n确认修改车型 #{}？(yes/no): ", id)).await? {
            return self.say("[提示] 已取消修改。").await;
        }

        collection::update_model(self.state, id, &updates).await?;
        self.say(&format!("\n[成功] 车型 #{} 已更新", id)).await
    }

    /// 6. 删除车型：yes/no 确认后还需输入 `DELETE`
    async fn delete_model(&mut self) -> AppResult<()> {
        self.say(&format!("\n删除车型\n{}", RULE)).await?;
        let Some(id) = self.prompt_number("要删除的编号: ").await? else {
            return Ok(());
        };

        let table = collection::load_collection(self.state).await?;
        let record = table
            .get(id)
            .ok_or_else(|| AppError::not_found(format!("编号 {} 的车型不存在", id)))?;
        let name = table.field(record, MODEL_NAME_COLUMN).unwrap_or("N/A").to_string();
        let series = table.field(record, SERIES_COLUMN).unwrap_or("N/A").to_string();

        self.say(&format!(
            "\n即将删除:\n  编号: {}\n  车型名称: {}\n  系列: {}",
            id, name, series
        ))
        .await?;

        if !self
            .confirm(&format!("\n确定要删除车型 #{} 吗？(yes/no): ", id))
            .await?
        {
            return self.say("[提示] 已取消删除。").await;
        }
        let typed = self
            .prompt("最终确认，请输入 DELETE: ")
            .await?
            .unwrap_or_default();
        if typed != "DELETE" {
            return self.say("[提示] 已取消删除。").await;
        }

        collection::delete_model(self.state, id).await?;
        self.say(&format!("\n[成功] 车型 #{} 已删除，其余记录已重新编号", id)).await
    }

    /// 7. 导出收藏清单到文件
    async fn export_collection(&mut self) -> AppResult<()> {
        self.say(&format!("\n导出收藏清单\n{}", RULE)).await?;
        let Some(format) = self.prompt("导出格式 md/json [md]: ").await? else {
            return Ok(());
        };
        let format: ExportFormat = if format.is_empty() {
            ExportFormat::Markdown
        } else {
            format.parse()?
        };

        let default_path = self
            .state
            .config()
            .data_dir
            .join(format!("HW_list_export.{}", format.extension()));
        let Some(target) = self
            .prompt(&format!("输出文件 [{}]: ", default_path.display()))
            .await?
        else {
            return Ok(());
        };
        let target = if target.is_empty() {
            default_path
        } else {
            PathBuf::from(target)
        };

        let table = collection::load_collection(self.state).await?;
        let content = export::export_table(&table, format, "DieCast Tracker 收藏清单")?;
        file_guard::atomic_write(&target, content.as_bytes()).await?;
        log::info!("已导出 {} 条记录到 {}", table.records.len(), target.display());

        self.say(&format!(
            "\n[成功] 已将 {} 条记录导出为 {}: {}",
            table.records.len(),
            format,
            target.display()
        ))
        .await
    }

    /// 8. 帮助
    async fn show_help(&mut self) -> AppResult<()> {
        let config = self.state.config();
        let help = format!(
            "\n帮助\n{rule}\n\
             功能:\n\
             \x20 - 添加车型时可直接输入 名称#12 选择第 1 个主系列的第 2 个子系列\n\
             \x20 - 搜索匹配所有字段，不区分大小写\n\
             \x20 - 修改和删除前都需要确认，删除需要再输入 DELETE\n\
             \x20 - 每次修改前都会自动备份\n\n\
             数据:\n\
             \x20 - 收藏清单: {collection}\n\
             \x20 - 预订清单: {preorders}\n\
             \x20 - 备份目录: {backups}\n\n\
             其他:\n\
             \x20 - 运行 `diecast-tracker serve` 启动 HTTP 接口（{bind}）\n\
             \x20 - 运行 `diecast-tracker --help` 查看全部命令",
            rule = RULE,
            collection = config.collection_path().display(),
            preorders = config.preorders_path().display(),
            backups = config.backup_dir_path().display(),
            bind = config.bind_addr,
        );
        self.say(&help).await
    }
}

/// 格式化一行分布统计，可选附带百分比条形图
fn breakdown_line(entry: &CountEntry, width: usize, with_bar: bool) -> String {
    let mut line = format!(
        "  {:<width$}: {:>4} ({:>5.1}%)",
        entry.name,
        entry.count,
        entry.percentage,
        width = width
    );
    if with_bar {
        line.push(' ');
        line.push_str(&"=".repeat((entry.percentage / 2.0) as usize));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::AppConfig;

    async fn setup() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(AppConfig::with_data_dir(dir.path())).await.unwrap();
        (dir, state)
    }

    async fn run_menu(state: &AppState, script: &str) -> String {
        let mut output = Vec::new();
        Menu::new(state, script.as_bytes(), &mut output).run().await.unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn add_with_shortcut_and_numbered_selection() {
        let (_dir, state) = setup().await;
        let out = run_menu(&state, "1\nTwin Mill#32\n1\nDeora\n2\n11\n9\n").await;
        assert!(out.contains("已选择: Premiums / Premiums Boulevard"));
        assert!(out.contains("编号 2"));

        let table = collection::load_collection(&state).await.unwrap();
        assert_eq!(table.records[0].fields, vec!["Twin Mill", "Premiums Boulevard"]);
        assert_eq!(table.records[1].fields, vec!["Deora", "Exotics"]);
    }

    #[tokio::test]
    async fn invalid_input_returns_to_menu() {
        let (_dir, state) = setup().await;
        let out = run_menu(&state, "42\n1\n\n5\nabc\n1\nX\n9\n").await;
        assert!(out.contains("无效的选择，请输入 1 到 9"));
        assert!(out.contains("车型名称不能为空"));
        assert!(out.contains("无效的编号: 'abc'"));
        // 主系列序号越界
        assert!(out.contains("无效的选择: 9"));
        assert!(collection::load_collection(&state).await.unwrap().records.is_empty());
    }

    #[tokio::test]
    async fn search_limits_output() {
        let (_dir, state) = setup().await;
        for i in 0..25 {
            collection::add_model(&state, &format!("Car {}", i), "Mainlines", "Mainlines")
                .await
                .unwrap();
        }
        let out = run_menu(&state, "2\ncar\n9\n").await;
        assert!(out.contains("找到 25 个车型"));
        assert!(out.contains("#20: Car 19 [Mainlines]"));
        assert!(!out.contains("#21: Car 20"));
        assert!(out.contains("另有 5 条结果"));
    }

    #[tokio::test]
    async fn delete_requires_both_confirmations() {
        let (_dir, state) = setup().await;
        collection::add_model(&state, "Twin Mill", "Mainlines", "Mainlines")
            .await
            .unwrap();

        run_menu(&state, "6\n1\nyes\ndelete\n9\n").await;
        assert_eq!(collection::load_collection(&state).await.unwrap().records.len(), 1);

        run_menu(&state, "6\n1\nno\n9\n").await;
        assert_eq!(collection::load_collection(&state).await.unwrap().records.len(), 1);

        let out = run_menu(&state, "6\n1\ny\nDELETE\n9\n").await;
        assert!(out.contains("[成功] 车型 #1 已删除"));
        assert!(collection::load_collection(&state).await.unwrap().records.is_empty());
    }

    #[tokio::test]
    async fn update_skips_empty_fields() {
        let (_dir, state) = setup().await;
        collection::add_model(&state, "Twin Mill", "Mainlines", "Mainlines")
            .await
            .unwrap();

        let out = run_menu(&state, "5\n1\nTwin Mill III\n\nyes\n9\n").await;
        assert!(out.contains("Model Name（当前: Twin Mill）"));
        let table = collection::load_collection(&state).await.unwrap();
        assert_eq!(table.records[0].fields, vec!["Twin Mill III", "Mainlines"]);

        let out = run_menu(&state, "5\n1\n\n\n9\n").await;
        assert!(out.contains("没有输入任何修改"));
    }

    #[tokio::test]
    async fn export_and_statistics() {
        let (dir, state) = setup().await;
        collection::add_model(&state, "Twin Mill", "Mainlines", "Mainlines")
            .await
            .unwrap();

        let target = dir.path().join("out.json");
        let script = format!("7\njson\n{}\n3\n4\nColour\n8\n9\n", target.display());
        let out = run_menu(&state, &script).await;

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(exported[0]["Model Name"], "Twin Mill");
        assert!(out.contains("车型总数: 1"));
        assert!(out.contains("下一个里程碑: 10 个车型"));
        assert!(out.contains("[成功] 已新增字段 'Colour'"));
        assert!(out.contains("备份目录:"));
    }
}
