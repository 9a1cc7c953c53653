use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// 学期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemesterType {
    /// 秋季学期（第1学期）：8月-次年1月
    Fall = 1,
    /// 春季学期（第2学期）：2月-7月
    Spring = 2,
}

impl SemesterType {
    pub fn from_number(semester: u32) -> Option<Self> {
        match semester {
            1 => Some(SemesterType::Fall),
            2 => Some(SemesterType::Spring),
            _ => None,
        }
    }

    pub fn number(self) -> u32 {
        self as u32
    }
}

/// 学年 + 学期，用于生成稳定的日历 UID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicTerm {
    /// 学年的起始年份，如 2024 表示 2024-2025 学年
    pub year: u32,
    pub semester: SemesterType,
}

impl AcademicTerm {
    pub fn new(year: u32, semester: u32) -> Result<Self, String> {
        let semester = SemesterType::from_number(semester).ok_or_else(|| {
            format!(
                "invalid semester number: {}, only 1 (fall) and 2 (spring) are supported",
                semester
            )
        })?;
        Ok(Self { year, semester })
    }

    /// 根据日期判断所在学期
    pub fn detect_from_date(date: NaiveDate) -> Self {
        let year = date.year().max(1) as u32;
        match date.month() {
            // 1月：属于上一学年的秋季学期
            1 => Self {
                year: year - 1,
                semester: SemesterType::Fall,
            },
            // 2-7月：上一学年的春季学期
            2..=7 => Self {
                year: year - 1,
                semester: SemesterType::Spring,
            },
            // 8-12月：当前学年的秋季学期
            _ => Self {
                year,
                semester: SemesterType::Fall,
            },
        }
    }

    /// 如 "2024-1"
    pub fn label(&self) -> String {
        format!("{}-{}", self.year, self.semester.number())
    }
}
