//! 参考数据（作息表、楼栋目录）的加载
//!
//! 查找顺序：显式路径，然后是环境变量，最后使用内置默认值。

use std::path::{Path, PathBuf};

use crate::{Error, Result, building::BuildingDirectory, period::PeriodTable};

/// 作息表文件路径的环境变量
pub const PERIODS_PATH_ENV: &str = "TIMETABLE_PERIODS_PATH";
/// 楼栋映射文件路径的环境变量
pub const BUILDINGS_PATH_ENV: &str = "TIMETABLE_BUILDINGS_PATH";

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub periods: PeriodTable,
    pub buildings: BuildingDirectory,
}

impl ReferenceData {
    pub fn load(periods_path: Option<&Path>, buildings_path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(periods_path, buildings_path, |key| std::env::var(key).ok())
    }

    /// 与 `load` 相同，但环境变量由调用方提供
    pub fn load_with_env<F>(
        periods_path: Option<&Path>,
        buildings_path: Option<&Path>,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |explicit: Option<&Path>, key: &str| -> Option<PathBuf> {
            explicit
                .map(Path::to_path_buf)
                .or_else(|| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        };

        let periods = match resolve(periods_path, PERIODS_PATH_ENV) {
            Some(path) => PeriodTable::from_path(&path)?,
            None => PeriodTable::default(),
        };

        // 文件中的楼栋叠加在内置目录之上
        let mut buildings = BuildingDirectory::default();
        if let Some(path) = resolve(buildings_path, BUILDINGS_PATH_ENV) {
            let content = std::fs::read_to_string(&path).map_err(|err| {
                Error::Config(format!(
                    "cannot read building mappings {}: {}",
                    path.display(),
                    err
                ))
            })?;
            buildings.load_from_json(&content)?;
        }

        Ok(Self { periods, buildings })
    }
}
