//! # 系列分类数据模型
//!
//! 两级分类：主系列（如 Mainlines、Premiums）下包含若干子系列。
//! 收藏清单的 `Series` 列存储的是子系列名称，统计时通过本模型反查主系列。
//!
//! 配置以 YAML 形式存放在 `series.yaml` 中，保持主系列和子系列的书写顺序：
//! ```yaml
//! series:
//!   - name: Mainlines
//!     subseries: [Mainlines, 57th Anniversary Series]
//!     description: Basic Hot Wheels cars available in most stores
//!     price_range: "₹180"
//!     rarity: Common
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

const DEFAULT_DESCRIPTION: &str = "No description available";
const DEFAULT_PRICE_RANGE: &str = "Varies";
const DEFAULT_RARITY: &str = "Unknown";

/// 单个主系列及其元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    /// 主系列名称
    pub name: String,

    /// 子系列列表（保持用户添加顺序，快捷输入依赖该顺序）
    #[serde(default)]
    pub subseries: Vec<String>,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_price_range")]
    pub price_range: String,

    #[serde(default = "default_rarity")]
    pub rarity: String,
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

fn default_price_range() -> String {
    DEFAULT_PRICE_RANGE.to_string()
}

fn default_rarity() -> String {
    DEFAULT_RARITY.to_string()
}

/// 系列分类目录（`series.yaml` 的顶层结构）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesCatalog {
    #[serde(default)]
    pub series: Vec<SeriesEntry>,
}

/// 快捷输入的解析结果
///
/// `"Twin Mill#12"` 表示第 1 个主系列下的第 2 个子系列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInput {
    /// 去掉快捷码后的车型名称
    pub model_name: String,
    /// 解析成功时为（主系列，子系列）
    pub selection: Option<(String, String)>,
}

impl Default for SeriesCatalog {
    /// 首次运行时使用的内置分类
    fn default() -> Self {
        let entry = |name: &str, subs: &[&str], description: &str, price: &str, rarity: &str| {
            SeriesEntry {
                name: name.to_string(),
                subseries: subs.iter().map(|s| s.to_string()).collect(),
                description: description.to_string(),
                price_range: price.to_string(),
                rarity: rarity.to_string(),
            }
        };
        Self {
            series: vec![
                entry(
                    "Mainlines",
                    &[
                        "Mainlines",
                        "54th Anniversary Series",
                        "57th Anniversary Series",
                        "53rd Anniversary Series",
                    ],
                    "Basic Hot Wheels cars available in most stores",
                    "₹180",
                    "Common",
                ),
                entry(
                    "Silver Series",
                    &[
                        "Ultra Hots",
                        "Silver Series BMW",
                        "Silver Series Fast & Furious Villains",
                        "Silver Series National Icons",
                        "Luxury Sedans",
                        "HW Speed Graphics",
                        "Neon Speeders",
                        "1/4 Mile Finals Series",
                        "Fast & Furious Hobbs & Shaw",
                        "Transformers",
                        "Exotics",
                    ],
                    "Mid-tier cars with better details and packaging",
                    "₹300",
                    "Uncommon",
                ),
                entry(
                    "Premiums",
                    &[
                        "Premiums Pop Culture",
                        "Premiums Boulevard",
                        "Premiums Fast & Furious",
                        "Premiums Car Culture",
                    ],
                    "High-quality cars with premium details and packaging",
                    "₹550",
                    "Rare",
                ),
                entry(
                    "Others",
                    &["Track Fleet", "Color Shifters"],
                    "Special categories and track sets",
                    "Varies",
                    "Varies",
                ),
            ],
        }
    }
}

impl SeriesCatalog {
    /// 所有主系列名称（按配置顺序）
    pub fn main_series_names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn entry(&self, main_series: &str) -> Option<&SeriesEntry> {
        self.series.iter().find(|s| s.name == main_series)
    }

    fn entry_mut(&mut self, main_series: &str) -> AppResult<&mut SeriesEntry> {
        self.series
            .iter_mut()
            .find(|s| s.name == main_series)
            .ok_or_else(|| AppError::not_found(format!("系列 '{}' 不存在", main_series)))
    }

    /// 指定主系列下的子系列；主系列不存在时返回空切片
    pub fn subseries_of(&self, main_series: &str) -> &[String] {
        self.entry(main_series)
            .map(|s| s.subseries.as_slice())
            .unwrap_or(&[])
    }

    /// 所有子系列的扁平列表
    pub fn all_subseries(&self) -> Vec<&str> {
        self.series
            .iter()
            .flat_map(|s| s.subseries.iter().map(String::as_str))
            .collect()
    }

    /// 反查子系列所属的主系列（第一个匹配）
    pub fn find_main_series(&self, subseries: &str) -> Option<&str> {
        self.series
            .iter()
            .find(|s| s.subseries.iter().any(|sub| sub == subseries))
            .map(|s| s.name.as_str())
    }

    pub fn is_valid_combination(&self, main_series: &str, subseries: &str) -> bool {
        self.subseries_of(main_series).iter().any(|s| s == subseries)
    }

    /// （主系列数量，子系列总数）
    pub fn counts(&self) -> (usize, usize) {
        (
            self.series.len(),
            self.series.iter().map(|s| s.subseries.len()).sum(),
        )
    }

    /// `{ 主系列: [子系列...] }`，按配置顺序，用于下拉选项
    pub fn options_map(&self) -> Map<String, Value> {
        self.series
            .iter()
            .map(|s| {
                (
                    s.name.clone(),
                    Value::Array(s.subseries.iter().cloned().map(Value::String).collect()),
                )
            })
            .collect()
    }

    /// 新增主系列，缺省的元数据使用默认值
    pub fn add_series(
        &mut self,
        name: &str,
        description: Option<&str>,
        price_range: Option<&str>,
        rarity: Option<&str>,
    ) -> AppResult<()> {
        let name = required_name(name, "系列名称")?;
        if self.entry(&name).is_some() {
            return Err(AppError::validation(format!("系列 '{}' 已存在", name)));
        }
        let pick = |value: Option<&str>, fallback: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        self.series.push(SeriesEntry {
            name,
            subseries: Vec::new(),
            description: pick(description, DEFAULT_DESCRIPTION),
            price_range: pick(price_range, DEFAULT_PRICE_RANGE),
            rarity: pick(rarity, DEFAULT_RARITY),
        });
        Ok(())
    }

    /// 向主系列追加子系列；主系列不存在时自动创建
    pub fn add_subseries(&mut self, main_series: &str, subseries: &str) -> AppResult<()> {
        let main_series = required_name(main_series, "系列名称")?;
        let subseries = required_name(subseries, "子系列名称")?;
        if self.entry(&main_series).is_none() {
            self.add_series(&main_series, None, None, None)?;
        }
        let entry = self.entry_mut(&main_series)?;
        if entry.subseries.contains(&subseries) {
            return Err(AppError::validation(format!(
                "子系列 '{}' 已存在于 '{}' 中",
                subseries, main_series
            )));
        }
        entry.subseries.push(subseries);
        Ok(())
    }

    pub fn remove_subseries(&mut self, main_series: &str, subseries: &str) -> AppResult<()> {
        let entry = self.entry_mut(main_series)?;
        let pos = entry
            .subseries
            .iter()
            .position(|s| s == subseries)
            .ok_or_else(|| {
                AppError::not_found(format!("子系列 '{}' 不在 '{}' 中", subseries, main_series))
            })?;
        entry.subseries.remove(pos);
        Ok(())
    }

    /// 重命名主系列，位置、子系列和元数据保持不变
    pub fn rename_series(&mut self, old_name: &str, new_name: &str) -> AppResult<()> {
        let new_name = required_name(new_name, "新系列名称")?;
        if self.entry(old_name).is_none() {
            return Err(AppError::not_found(format!("系列 '{}' 不存在", old_name)));
        }
        if self.entry(&new_name).is_some() {
            return Err(AppError::validation(format!("系列 '{}' 已存在", new_name)));
        }
        self.entry_mut(old_name)?.name = new_name;
        Ok(())
    }

    /// 重命名子系列，保持其在列表中的位置
    pub fn rename_subseries(
        &mut self,
        main_series: &str,
        old_name: &str,
        new_name: &str,
    ) -> AppResult<()> {
        let new_name = required_name(new_name, "新子系列名称")?;
        let entry = self.entry_mut(main_series)?;
        let pos = entry
            .subseries
            .iter()
            .position(|s| s == old_name)
            .ok_or_else(|| {
                AppError::not_found(format!("子系列 '{}' 不在 '{}' 中", old_name, main_series))
            })?;
        if entry.subseries.contains(&new_name) {
            return Err(AppError::validation(format!(
                "子系列 '{}' 已存在于 '{}' 中",
                new_name, main_series
            )));
        }
        entry.subseries[pos] = new_name;
        Ok(())
    }

    /// 解析 `"车型名#主子"` 形式的快捷输入
    ///
    /// 快捷码必须是两位数字，分别为主系列和子系列的序号（从 1 开始）。
    /// 没有 `#`、快捷码格式不对或序号越界时，`selection` 为 `None`。
    pub fn parse_shortcut(&self, input: &str) -> ShortcutInput {
        let Some((name, code)) = input.split_once('#') else {
            return ShortcutInput {
                model_name: input.trim().to_string(),
                selection: None,
            };
        };
        let model_name = name.trim().to_string();

        let digits: Vec<usize> = code
            .trim()
            .chars()
            .filter_map(|c| c.to_digit(10).map(|d| d as usize))
            .collect();
        let selection = match digits.as_slice() {
            [main, sub] if code.trim().len() == 2 => self
                .series
                .get(main.wrapping_sub(1))
                .and_then(|entry| {
                    entry
                        .subseries
                        .get(sub.wrapping_sub(1))
                        .map(|s| (entry.name.clone(), s.clone()))
                }),
            _ => None,
        };

        ShortcutInput {
            model_name,
            selection,
        }
    }
}

/// 去除首尾空白并要求非空
fn required_name(value: &str, label: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{}不能为空", label)));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_lookups() {
        let catalog = SeriesCatalog::default();
        assert_eq!(
            catalog.main_series_names(),
            vec!["Mainlines", "Silver Series", "Premiums", "Others"]
        );
        assert_eq!(catalog.find_main_series("Ultra Hots"), Some("Silver Series"));
        assert_eq!(catalog.find_main_series("Nope"), None);
        assert!(catalog.is_valid_combination("Mainlines", "Mainlines"));
        assert!(!catalog.is_valid_combination("Premiums", "Mainlines"));
        assert_eq!(catalog.counts(), (4, 21));
        assert!(catalog.subseries_of("Missing").is_empty());
    }

    #[test]
    fn add_and_rename_series() {
        let mut catalog = SeriesCatalog::default();
        catalog
            .add_series("Team Transport", Some("Truck + car sets"), None, Some(" "))
            .unwrap();
        let entry = catalog.entry("Team Transport").unwrap();
        assert_eq!(entry.description, "Truck + car sets");
        assert_eq!(entry.price_range, "Varies");
        assert_eq!(entry.rarity, "Unknown");

        assert!(matches!(
            catalog.add_series("Premiums", None, None, None),
            Err(AppError::Validation(_))
        ));

        catalog.rename_series("Premiums", "Premium").unwrap();
        assert_eq!(catalog.main_series_names()[2], "Premium");
        assert_eq!(catalog.entry("Premium").unwrap().rarity, "Rare");
        assert!(matches!(
            catalog.rename_series("Premiums", "X"),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            catalog.rename_series("Premium", "Others"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn subseries_edits() {
        let mut catalog = SeriesCatalog::default();
        catalog.add_subseries("Mainlines", "Treasure Hunts").unwrap();
        assert_eq!(catalog.subseries_of("Mainlines").last().unwrap(), "Treasure Hunts");
        assert!(catalog.add_subseries("Mainlines", "Treasure Hunts").is_err());

        // 主系列不存在时自动创建
        catalog.add_subseries("Monster Trucks", "Glow in the Dark").unwrap();
        assert_eq!(catalog.find_main_series("Glow in the Dark"), Some("Monster Trucks"));

        catalog
            .rename_subseries("Others", "Track Fleet", "Track Builder")
            .unwrap();
        assert_eq!(catalog.subseries_of("Others")[0], "Track Builder");

        catalog.remove_subseries("Others", "Color Shifters").unwrap();
        assert_eq!(catalog.subseries_of("Others").len(), 1);
        assert!(matches!(
            catalog.remove_subseries("Others", "Color Shifters"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn shortcut_parsing() {
        let catalog = SeriesCatalog::default();
        let parsed = catalog.parse_shortcut("Twin Mill #21");
        assert_eq!(parsed.model_name, "Twin Mill");
        assert_eq!(
            parsed.selection,
            Some(("Silver Series".to_string(), "Ultra Hots".to_string()))
        );

        assert_eq!(catalog.parse_shortcut("Deora").selection, None);
        assert_eq!(catalog.parse_shortcut("Deora#9").selection, None);
        assert_eq!(catalog.parse_shortcut("Deora#19").selection, None);
        assert_eq!(catalog.parse_shortcut("Deora#0").selection, None);
        assert_eq!(catalog.parse_shortcut("Deora#1a").selection, None);
        assert_eq!(catalog.parse_shortcut("Deora#123").selection, None);
        assert_eq!(catalog.parse_shortcut("Deora#09").selection, None);
    }

    #[test]
    fn yaml_metadata_defaults() {
        let catalog: SeriesCatalog =
            serde_yaml::from_str("series:\n  - name: Mainlines\n    subseries: [Mainlines]\n").unwrap();
        assert_eq!(catalog.series[0].description, "No description available");
        assert_eq!(catalog.series[0].price_range, "Varies");
    }
}
