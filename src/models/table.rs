//! # 表格数据模型
//!
//! 定义收藏清单和预订清单共用的表格结构：
//! - `Record` - 一行记录：整数编号 + 若干文本字段
//! - `Table` - 表头 + 按顺序排列的记录
//!
//! ## 编号不变量
//! 记录编号始终是从 1 开始的连续整数，删除后立即重新编号。
//! 编号代表的是"行位置"而非稳定主键，任何删除都会让后面记录的编号前移。
//!
//! 表格上的增删改操作都是纯内存操作，文件读写和备份由 `services::store` 负责。

use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// 编号列的列名（表头第一列）
pub const ID_COLUMN: &str = "S.No";

/// 收藏清单新建时的默认表头
pub const DEFAULT_COLLECTION_HEADER: &[&str] = &["S.No", "Model Name", "Series"];

/// 字段名最大长度（字符数）
pub const MAX_COLUMN_NAME_LEN: usize = 50;

/// 字段名中不允许出现的字符
pub const RESERVED_COLUMN_CHARS: &[char] = &['/', '\\', '?', '*', '[', ']', ':', ';'];

/// 表格中的一行记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 记录编号（第一列），从 1 开始连续
    pub id: u64,
    /// 编号之后的各字段值，与表头第 2 列起一一对应
    pub fields: Vec<String>,
}

impl Record {
    /// 转换为 `{ 列名: 值 }` 形式的 JSON 对象，编号列保持为数字
    pub fn to_json(&self, columns: &[String]) -> Value {
        let mut obj = Map::new();
        if let Some(id_col) = columns.first() {
            obj.insert(id_col.clone(), Value::from(self.id));
        }
        for (name, value) in columns.iter().skip(1).zip(self.fields.iter()) {
            obj.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(obj)
    }
}

/// 完整的表格：表头 + 记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// 表头列名，第一列为编号列
    pub columns: Vec<String>,
    /// 按文件顺序排列的记录
    pub records: Vec<Record>,
}

impl Table {
    /// 创建只有表头、没有记录的空表
    pub fn with_header<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            records: Vec::new(),
        }
    }

    /// 编号之后的字段数量
    pub fn field_width(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }

    /// 查找列名在表头中的位置（0 为编号列）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 读取指定记录在指定列上的字段值
    pub fn field<'a>(&self, record: &'a Record, column: &str) -> Option<&'a str> {
        let idx = self.column_index(column)?;
        if idx == 0 {
            return None;
        }
        record.fields.get(idx - 1).map(String::as_str)
    }

    /// 线性扫描查找编号对应的行位置
    pub fn position(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// 按编号查找记录
    pub fn get(&self, id: u64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// 追加一条记录，编号为当前记录数 + 1
    ///
    /// 字段数少于表头时以空字符串补齐，多于表头时截断。
    pub fn insert(&mut self, mut fields: Vec<String>) -> u64 {
        fields.resize(self.field_width(), String::new());
        let id = self.records.len() as u64 + 1;
        self.records.push(Record { id, fields });
        id
    }

    /// 更新指定记录的若干字段
    ///
    /// 先校验全部字段名，再统一写入，校验失败时表格保持不变。
    /// 写入值会去除首尾空白，空字符串即清空该字段；未提及的字段不受影响。
    ///
    /// # 错误
    /// - 记录不存在 → `NotFound`
    /// - 字段名不在表头中或试图修改编号列 → `Validation`
    pub fn update_fields(&mut self, id: u64, updates: &[(String, String)]) -> AppResult<()> {
        let pos = self
            .position(id)
            .ok_or_else(|| AppError::not_found(format!("未找到编号为 {} 的记录", id)))?;

        let mut resolved = Vec::with_capacity(updates.len());
        for (name, value) in updates {
            match self.column_index(name) {
                Some(0) => {
                    return Err(AppError::validation(format!(
                        "编号列 '{}' 由系统维护，不能直接修改",
                        name
                    )));
                }
                Some(idx) => resolved.push((idx - 1, value.trim().to_string())),
                None => {
                    return Err(AppError::validation(format!("字段 '{}' 不存在", name)));
                }
            }
        }

        let record = &mut self.records[pos];
        for (idx, value) in resolved {
            record.fields[idx] = value;
        }
        Ok(())
    }

    /// 删除指定记录并重新编号，返回被删除的记录（删除前的编号）
    pub fn delete(&mut self, id: u64) -> AppResult<Record> {
        let pos = self
            .position(id)
            .ok_or_else(|| AppError::not_found(format!("未找到编号为 {} 的记录", id)))?;
        let removed = self.records.remove(pos);
        self.renumber();
        Ok(removed)
    }

    /// 将所有记录的编号重排为 1..=N
    pub fn renumber(&mut self) {
        for (i, record) in self.records.iter_mut().enumerate() {
            record.id = i as u64 + 1;
        }
    }

    /// 在表头末尾追加新字段，已有记录在该列上补空字符串
    ///
    /// # 返回值
    /// 新列在表头中的位置（从 1 开始计数）
    pub fn add_column(&mut self, name: &str) -> AppResult<usize> {
        let name = validate_column_name(name)?;
        if self.columns.iter().any(|c| *c == name) {
            return Err(AppError::validation(format!("字段 '{}' 已存在", name)));
        }
        self.columns.push(name);
        for record in &mut self.records {
            record.fields.push(String::new());
        }
        Ok(self.columns.len())
    }

    /// 全部记录转换为 JSON 对象数组
    pub fn to_json_rows(&self) -> Vec<Value> {
        self.records.iter().map(|r| r.to_json(&self.columns)).collect()
    }
}

/// 校验并规范化字段名（去除首尾空白）
///
/// # 错误
/// 名称为空、超过长度限制、包含保留字符或控制字符时返回 `Validation`
pub fn validate_column_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("字段名不能为空"));
    }
    if name.chars().count() > MAX_COLUMN_NAME_LEN {
        return Err(AppError::validation(format!(
            "字段名过长（最多 {} 个字符）",
            MAX_COLUMN_NAME_LEN
        )));
    }
    if name
        .chars()
        .any(|c| RESERVED_COLUMN_CHARS.contains(&c) || c.is_control())
    {
        let reserved: Vec<String> = RESERVED_COLUMN_CHARS.iter().map(|c| c.to_string()).collect();
        return Err(AppError::validation(format!(
            "字段名包含非法字符: {}",
            reserved.join(", ")
        )));
    }
    Ok(name.to_string())
}
