use std::{
    collections::{BTreeMap, HashMap},
    sync::OnceLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Classroom, Result};

/// 楼栋映射项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// 两位楼栋代码，如 "ED"
    pub code: String,
    pub name_en: String,
    pub name_zh: String,
}

/// 内置楼栋表 (代码, 英文名, 中文名)
const DEFAULT_BUILDINGS: &[(&str, &str, &str)] = &[
    ("AC", "Student Activity Center", "學生活動中心"),
    ("BA", "Biotechnology Building", "生物科技實驗館"),
    ("BI", "Bio-ICT Building", "生醫工程館"),
    ("CS", "Computer Science Building", "資訊技術服務中心"),
    ("EA", "Engineering Building I", "工程一館"),
    ("EB", "Engineering Building II", "工程二館"),
    ("EC", "Engineering Building III", "工程三館"),
    ("ED", "Engineering Building IV", "工程四館"),
    ("EE", "Engineering Building V", "工程五館"),
    ("EF", "Engineering Building VI", "工程六館"),
    ("HA", "Humanities and Social Sciences Building I", "人社一館"),
    ("HB", "Humanities and Social Sciences Building II", "人社二館"),
    ("HC", "Humanities and Social Sciences Building III", "人社三館"),
    ("MB", "Management Building I", "管理一館"),
    ("SA", "Science Building I", "科學一館"),
    ("SB", "Science Building II", "科學二館"),
    ("SC", "Science Building III", "科學三館"),
    ("GM", "Gymnasium", "體育館"),
    ("LI", "Library", "圖書館"),
];

fn classroom_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<code>[A-Za-z]{2})(?P<room>[0-9][0-9A-Za-z-]*)(?:\[(?P<floor>[^\]]*)\])?$")
            .expect("classroom pattern is valid")
    })
}

fn floor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(?P<floor>[^\]]*)\]$").expect("floor pattern is valid"))
}

/// 楼栋目录：代码与中英文名称的双向查询
#[derive(Debug, Clone)]
pub struct BuildingDirectory {
    buildings: HashMap<String, Building>,
}

impl BuildingDirectory {
    /// 创建空目录
    pub fn new() -> Self {
        Self {
            buildings: HashMap::new(),
        }
    }

    /// 进程内共享的默认目录，只读
    pub fn global() -> &'static BuildingDirectory {
        static DIRECTORY: OnceLock<BuildingDirectory> = OnceLock::new();
        DIRECTORY.get_or_init(BuildingDirectory::default)
    }

    /// 从JSON字符串加载楼栋映射，同代码的条目会被覆盖
    pub fn load_from_json(&mut self, json_data: &str) -> Result<usize> {
        let buildings: Vec<Building> = serde_json::from_str(json_data)?;
        let count = buildings.len();

        for building in buildings {
            self.add_building(building);
        }

        tracing::info!("Loaded {} building mappings", count);
        Ok(count)
    }

    pub fn add_building(&mut self, mut building: Building) {
        building.code = building.code.trim().to_ascii_uppercase();
        self.buildings.insert(building.code.clone(), building);
    }

    /// 按代码查找，大小写不敏感
    pub fn lookup(&self, code: &str) -> Option<&Building> {
        self.buildings.get(&code.trim().to_ascii_uppercase())
    }

    /// 反向查找：按中文或英文名称查代码
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.buildings
            .values()
            .find(|b| b.name_zh == name || b.name_en.eq_ignore_ascii_case(name))
            .map(|b| b.code.as_str())
    }

    /// 按代码排序的全部映射
    pub fn all(&self) -> BTreeMap<&str, &Building> {
        self.buildings
            .iter()
            .map(|(code, building)| (code.as_str(), building))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn export_to_json(&self) -> Result<String> {
        let buildings: Vec<&Building> = self.all().into_values().collect();
        Ok(serde_json::to_string_pretty(&buildings)?)
    }

    /// 解析教室代码，如 "ED201[GF]"
    ///
    /// 空字符串返回 None。未知楼栋或格式不符都不会失败，
    /// 楼栋名称退回为原始代码。
    pub fn parse_classroom(&self, raw: &str) -> Option<Classroom> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let Some(caps) = classroom_pattern().captures(raw) else {
            tracing::debug!("Unrecognized classroom format: {}", raw);
            let floor_tag = floor_pattern()
                .captures(raw)
                .map(|caps| caps["floor"].to_string())
                .filter(|tag| !tag.is_empty());
            let building_code = floor_pattern().replace(raw, "").trim().to_string();
            return Some(Classroom {
                display_name: building_code.clone(),
                building_code,
                building_name_en: raw.to_string(),
                building_name_zh: raw.to_string(),
                room_number: String::new(),
                floor_tag,
                raw_code: raw.to_string(),
            });
        };

        let building_code = caps["code"].to_ascii_uppercase();
        let room_number = caps["room"].to_string();
        let floor_tag = caps
            .name("floor")
            .map(|m| m.as_str().trim().to_string())
            .filter(|tag| !tag.is_empty());

        let (building_name_en, building_name_zh) = match self.lookup(&building_code) {
            Some(building) => (building.name_en.clone(), building.name_zh.clone()),
            None => {
                tracing::debug!("Unknown building code {}, using raw code", building_code);
                (raw.to_string(), raw.to_string())
            }
        };

        Some(Classroom {
            display_name: format!("{}{}", building_code, room_number),
            building_code,
            building_name_en,
            building_name_zh,
            room_number,
            floor_tag,
            raw_code: raw.to_string(),
        })
    }
}

impl Default for BuildingDirectory {
    fn default() -> Self {
        let mut directory = Self::new();
        for (code, name_en, name_zh) in DEFAULT_BUILDINGS {
            directory.add_building(Building {
                code: code.to_string(),
                name_en: name_en.to_string(),
                name_zh: name_zh.to_string(),
            });
        }
        directory
    }
}
