//! # 表格存储服务
//!
//! `RecordStore` 绑定一个表格文件，提供加载、插入、更新、删除、加列五个操作。
//! 每个修改操作都是一次完整的"读取-修改-写入"周期，不保留任何跨请求的内存状态。
//!
//! ## 修改操作的执行顺序
//! 1. 获取该文件的互斥锁（同一文件的修改串行执行）
//! 2. 文件存在性检查（插入操作除外：文件不存在时以默认表头新建）
//! 3. 备份（失败则中止，文件保持不变）
//! 4. 加载整张表
//! 5. 在内存中修改（失败则不写入）
//! 6. 原子写回

use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::table::{Record, Table};
use crate::services::state::AppState;
use crate::services::{file_guard, parser, search};

/// 某个表格文件的存储句柄
pub struct RecordStore<'a> {
    state: &'a AppState,
    path: PathBuf,
    /// 文件不存在时新建表格使用的表头
    default_header: Vec<String>,
    /// 加载时需要迁移的旧列名：（旧名，新名）
    renamed_columns: &'static [(&'static str, &'static str)],
}

impl<'a> RecordStore<'a> {
    pub fn new<S: AsRef<str>>(state: &'a AppState, path: PathBuf, default_header: &[S]) -> Self {
        Self {
            state,
            path,
            default_header: default_header.iter().map(|s| s.as_ref().to_string()).collect(),
            renamed_columns: &[],
        }
    }

    /// 加载时把旧列名迁移为新列名（新列名已存在时不迁移）
    pub fn with_renamed_columns(mut self, renamed: &'static [(&'static str, &'static str)]) -> Self {
        self.renamed_columns = renamed;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载整张表
    ///
    /// # 错误
    /// 文件不存在 → `NotFound`
    pub async fn load(&self) -> AppResult<Table> {
        let mut table = parser::read_table(&self.path).await?;
        self.migrate_columns(&mut table);
        Ok(table)
    }

    /// 加载整张表；文件不存在时返回只有默认表头的空表
    pub async fn load_or_empty(&self) -> AppResult<Table> {
        if self.path.exists() {
            self.load().await
        } else {
            Ok(Table::with_header(&self.default_header))
        }
    }

    /// 追加一条记录，返回新记录的编号
    pub async fn insert(&self, fields: Vec<String>, operation: &str) -> AppResult<u64> {
        self.mutate(operation, true, move |table| Ok(table.insert(fields)))
            .await
    }

    /// 更新指定记录的若干字段
    pub async fn update_fields(
        &self,
        id: u64,
        updates: &[(String, String)],
        operation: &str,
    ) -> AppResult<()> {
        self.mutate(operation, false, |table| table.update_fields(id, updates))
            .await
    }

    /// 删除指定记录，返回被删除的记录
    pub async fn delete(&self, id: u64, operation: &str) -> AppResult<Record> {
        self.mutate(operation, false, |table| table.delete(id)).await
    }

    /// 追加新字段，返回新列位置（从 1 开始）
    pub async fn add_column(&self, name: &str, operation: &str) -> AppResult<usize> {
        self.mutate(operation, false, |table| table.add_column(name))
            .await
    }

    /// 搜索：返回表头和匹配的记录
    pub async fn search(&self, query: &str) -> AppResult<(Vec<String>, Vec<Record>)> {
        let table = self.load().await?;
        let hits = search::search_records(&table, query)
            .into_iter()
            .cloned()
            .collect();
        Ok((table.columns, hits))
    }

    /// 通用修改流程：锁 → 存在性检查 → 备份 → 加载 → 修改 → 写入
    ///
    /// `create_if_missing` 为 `true` 时，文件不存在则以默认表头新建（不做备份）。
    pub async fn mutate<T, F>(&self, operation: &str, create_if_missing: bool, edit: F) -> AppResult<T>
    where
        F: FnOnce(&mut Table) -> AppResult<T>,
    {
        let lock = self.state.file_lock(&self.path);
        let _guard = lock.lock().await;

        if !create_if_missing && !self.path.exists() {
            return Err(AppError::not_found(format!(
                "表格文件不存在: {}",
                self.path.display()
            )));
        }

        file_guard::backup_before_write(&self.path, operation, self.state).await?;

        let mut table = self.load_or_empty().await?;
        let result = edit(&mut table)?;

        let content = parser::serialize_table(&table)?;
        file_guard::atomic_write(&self.path, content.as_bytes()).await?;
        log::info!(
            "{}: {} 已保存（{} 条记录）",
            operation,
            self.path.display(),
            table.records.len()
        );
        Ok(result)
    }

    fn migrate_columns(&self, table: &mut Table) {
        for (old, new) in self.renamed_columns {
            if table.column_index(new).is_some() {
                continue;
            }
            if let Some(idx) = table.column_index(old) {
                log::info!("{}: 列名 '{}' 已迁移为 '{}'", self.path.display(), old, new);
                table.columns[idx] = new.to_string();
            }
        }
    }
}
