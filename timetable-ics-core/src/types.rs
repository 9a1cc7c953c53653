use std::{collections::BTreeSet, fmt, ops::RangeInclusive};

use chrono::{DateTime, FixedOffset, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, semester::AcademicTerm};

/// 课程标识（由选课列表提供）
pub type CourseId = String;

/// 星期代码
///
/// 字母编码为 `M,T,W,R,F,S,U`，其中星期四是 `R`（避免与星期二 `T` 冲突）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayCode {
    #[serde(rename = "M")]
    Mon,
    #[serde(rename = "T")]
    Tue,
    #[serde(rename = "W")]
    Wed,
    #[serde(rename = "R")]
    Thu,
    #[serde(rename = "F")]
    Fri,
    #[serde(rename = "S")]
    Sat,
    #[serde(rename = "U")]
    Sun,
}

impl DayCode {
    pub const ALL: [DayCode; 7] = [
        DayCode::Mon,
        DayCode::Tue,
        DayCode::Wed,
        DayCode::Thu,
        DayCode::Fri,
        DayCode::Sat,
        DayCode::Sun,
    ];

    /// 从字母解析，只接受大写的七个字母
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'M' => Some(DayCode::Mon),
            'T' => Some(DayCode::Tue),
            'W' => Some(DayCode::Wed),
            'R' => Some(DayCode::Thu),
            'F' => Some(DayCode::Fri),
            'S' => Some(DayCode::Sat),
            'U' => Some(DayCode::Sun),
            _ => None,
        }
    }

    /// 从数字编码解析 (1=Monday, 7=Sunday)
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1..=7 => Some(Self::ALL[(number - 1) as usize]),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            DayCode::Mon => 'M',
            DayCode::Tue => 'T',
            DayCode::Wed => 'W',
            DayCode::Thu => 'R',
            DayCode::Fri => 'F',
            DayCode::Sat => 'S',
            DayCode::Sun => 'U',
        }
    }

    /// 网格列下标，星期一为 0
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn weekday(self) -> Weekday {
        match self {
            DayCode::Mon => Weekday::Mon,
            DayCode::Tue => Weekday::Tue,
            DayCode::Wed => Weekday::Wed,
            DayCode::Thu => Weekday::Thu,
            DayCode::Fri => Weekday::Fri,
            DayCode::Sat => Weekday::Sat,
            DayCode::Sun => Weekday::Sun,
        }
    }

    /// RFC 5545 BYDAY 代码
    pub fn ics_code(self) -> &'static str {
        match self {
            DayCode::Mon => "MO",
            DayCode::Tue => "TU",
            DayCode::Wed => "WE",
            DayCode::Thu => "TH",
            DayCode::Fri => "FR",
            DayCode::Sat => "SA",
            DayCode::Sun => "SU",
        }
    }

    pub fn name_en(self) -> &'static str {
        match self {
            DayCode::Mon => "Monday",
            DayCode::Tue => "Tuesday",
            DayCode::Wed => "Wednesday",
            DayCode::Thu => "Thursday",
            DayCode::Fri => "Friday",
            DayCode::Sat => "Saturday",
            DayCode::Sun => "Sunday",
        }
    }

    pub fn name_zh(self) -> &'static str {
        match self {
            DayCode::Mon => "星期一",
            DayCode::Tue => "星期二",
            DayCode::Wed => "星期三",
            DayCode::Thu => "星期四",
            DayCode::Fri => "星期五",
            DayCode::Sat => "星期六",
            DayCode::Sun => "星期日",
        }
    }
}

impl fmt::Display for DayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// 节次，取值 1..=14
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Period(u8);

impl Period {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 14;
    pub const COUNT: usize = Self::MAX as usize;

    pub fn new(index: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&index).then_some(Self(index))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// 网格行下标，第 1 节为 0
    pub fn row(self) -> usize {
        (self.0 - Self::MIN) as usize
    }

    pub fn all() -> impl Iterator<Item = Period> {
        (Self::MIN..=Self::MAX).map(Period)
    }
}

impl TryFrom<u8> for Period {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Period::new(value).ok_or_else(|| {
            format!(
                "period {} out of range {}..={}",
                value,
                Period::MIN,
                Period::MAX
            )
        })
    }
}

impl From<Period> for u8 {
    fn from(period: Period) -> Self {
        period.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 把有序节次集合切分为连续区间，如 `[1,2,5,6]` -> `[1..=2, 5..=6]`
pub fn period_runs(periods: &BTreeSet<Period>) -> Vec<RangeInclusive<Period>> {
    let mut runs: Vec<RangeInclusive<Period>> = Vec::new();
    for &period in periods {
        match runs.last_mut() {
            Some(run) if run.end().get() + 1 == period.get() => {
                *run = *run.start()..=period;
            }
            _ => runs.push(period..=period),
        }
    }
    runs
}

/// 一门课在某一天的上课信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meeting {
    pub day: DayCode,
    pub periods: BTreeSet<Period>,
    /// 展示用的节次区间，如 "1-2, 5-6"
    pub period_range_label: String,
}

impl Meeting {
    /// 节次为空时返回 None
    pub fn new(day: DayCode, periods: BTreeSet<Period>) -> Option<Self> {
        if periods.is_empty() {
            return None;
        }
        let period_range_label = Self::range_label(&periods);
        Some(Self {
            day,
            periods,
            period_range_label,
        })
    }

    pub fn range_label(periods: &BTreeSet<Period>) -> String {
        period_runs(periods)
            .iter()
            .map(|run| {
                if run.start() == run.end() {
                    run.start().to_string()
                } else {
                    format!("{}-{}", run.start(), run.end())
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn runs(&self) -> Vec<RangeInclusive<Period>> {
        period_runs(&self.periods)
    }

    pub fn first_period(&self) -> Period {
        // periods 非空由构造函数保证
        *self.periods.first().unwrap_or(&Period(Period::MIN))
    }

    pub fn last_period(&self) -> Period {
        *self.periods.last().unwrap_or(&Period(Period::MIN))
    }
}

/// 教室信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub building_code: String,
    pub building_name_en: String,
    pub building_name_zh: String,
    pub room_number: String,
    /// 楼层标记，如 "GF"
    pub floor_tag: Option<String>,
    /// 原始教室代码
    pub raw_code: String,
    /// 简短展示名：楼栋代码 + 房间号
    pub display_name: String,
}

/// 课程时间字符串中以逗号分隔的一段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleBlock {
    pub meetings: Vec<Meeting>,
    pub classroom: Option<Classroom>,
}

/// 一门课完整的解析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSchedule {
    pub blocks: Vec<ScheduleBlock>,
    /// 原始字符串
    pub source: String,
}

impl CourseSchedule {
    pub fn empty() -> Self {
        Self {
            blocks: Vec::new(),
            source: String::new(),
        }
    }

    /// 没有可用的上课时间
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn meeting_count(&self) -> usize {
        self.blocks.iter().map(|block| block.meetings.len()).sum()
    }

    /// 按块顺序遍历 (块下标, 块, 上课信息)
    pub fn meetings(&self) -> impl Iterator<Item = (usize, &ScheduleBlock, &Meeting)> {
        self.blocks.iter().enumerate().flat_map(|(index, block)| {
            block
                .meetings
                .iter()
                .map(move |meeting| (index, block, meeting))
        })
    }
}

/// 课程目录中的原始记录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: CourseId,
    /// 课程编号
    #[serde(default)]
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub credits: Option<f32>,
    /// 合并格式，如 "M56R2-ED201[GF]"
    #[serde(default)]
    pub time_classroom: Option<String>,
    /// 数字格式的星期，如 "1,3"
    #[serde(default)]
    pub day_codes: Option<String>,
    /// 数字格式的节次，如 "34,AB"
    #[serde(default)]
    pub time_codes: Option<String>,
    /// 数字格式对应的教室
    #[serde(default)]
    pub classroom_codes: Option<String>,
}

/// 已选课程
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub number: String,
    pub name: String,
    pub instructor: Option<String>,
    pub credits: Option<f32>,
    pub schedule: CourseSchedule,
}

/// 日历导出选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOptions {
    /// 日历名称
    pub calendar_name: Option<String>,
    /// 时区名称，写入 X-WR-TIMEZONE
    pub timezone: Option<String>,
    /// 作息表所在时区相对 UTC 的分钟数
    pub utc_offset_minutes: i32,
    /// 学年与学期，参与 UID 的生成
    pub term: AcademicTerm,
    /// 学期周数，即 RRULE 的 COUNT
    pub term_weeks: u32,
    /// 是否包含课程描述
    pub include_description: bool,
    pub reminder_minutes: Option<u32>,
    /// "下一次上课" 的参照时间，也用作 DTSTAMP
    pub reference_time: DateTime<Utc>,
}

impl ExportOptions {
    pub const DEFAULT_TERM_WEEKS: u32 = 18;
    pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

    /// 以指定时间为参照的默认选项，学期由该时间推算
    pub fn at(reference_time: DateTime<Utc>) -> Self {
        let local_date = FixedOffset::east_opt(Self::DEFAULT_UTC_OFFSET_MINUTES * 60)
            .map(|offset| reference_time.with_timezone(&offset).date_naive())
            .unwrap_or_else(|| reference_time.date_naive());

        Self {
            calendar_name: Some("课程表".to_string()),
            timezone: Some("Asia/Taipei".to_string()),
            utc_offset_minutes: Self::DEFAULT_UTC_OFFSET_MINUTES,
            term: AcademicTerm::detect_from_date(local_date),
            term_weeks: Self::DEFAULT_TERM_WEEKS,
            include_description: true,
            reminder_minutes: Some(10),
            reference_time,
        }
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::Config(format!(
                    "invalid UTC offset: {} minutes",
                    self.utc_offset_minutes
                ))
            })
    }

    pub fn validate(&self) -> Result<()> {
        if self.term_weeks == 0 {
            return Err(Error::Config("term_weeks must be at least 1".to_string()));
        }
        self.offset().map(|_| ())
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periods(values: &[u8]) -> BTreeSet<Period> {
        values.iter().filter_map(|&v| Period::new(v)).collect()
    }

    #[test]
    fn test_period_bounds() {
        assert!(Period::new(0).is_none());
        assert!(Period::new(15).is_none());
        assert_eq!(Period::new(14).map(Period::get), Some(14));
        assert_eq!(Period::all().count(), Period::COUNT);
    }

    #[test]
    fn test_range_label() {
        assert_eq!(Meeting::range_label(&periods(&[5, 6])), "5-6");
        assert_eq!(Meeting::range_label(&periods(&[1, 3, 5])), "1, 3, 5");
        assert_eq!(Meeting::range_label(&periods(&[1, 2, 5, 6])), "1-2, 5-6");
        assert_eq!(Meeting::range_label(&periods(&[2])), "2");
        assert_eq!(Meeting::range_label(&periods(&[9, 10, 11])), "9-11");
    }

    #[test]
    fn test_empty_meeting_rejected() {
        assert!(Meeting::new(DayCode::Mon, BTreeSet::new()).is_none());
    }

    #[test]
    fn test_day_codes() {
        assert_eq!(DayCode::from_letter('R'), Some(DayCode::Thu));
        assert_eq!(DayCode::from_letter('T'), Some(DayCode::Tue));
        assert_eq!(DayCode::from_letter('X'), None);
        assert_eq!(DayCode::from_letter('m'), None);
        assert_eq!(DayCode::from_number(7), Some(DayCode::Sun));
        assert_eq!(DayCode::from_number(0), None);
        for day in DayCode::ALL {
            assert_eq!(DayCode::from_letter(day.letter()), Some(day));
        }
    }

    #[test]
    fn test_out_of_range_offset_rejected() {
        let reference = DateTime::parse_from_rfc3339("2024-10-20T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut options = ExportOptions::at(reference);
        assert!(options.validate().is_ok());

        options.utc_offset_minutes = 40_000_000;
        assert!(matches!(options.validate(), Err(Error::Config(_))));
        options.utc_offset_minutes = i32::MIN;
        assert!(matches!(options.offset(), Err(Error::Config(_))));
        // 超过 ±24 小时
        options.utc_offset_minutes = 24 * 60;
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_period_serde() {
        let json = serde_json::to_string(&Period::new(11)).unwrap();
        assert_eq!(json, "11");
        assert!(serde_json::from_str::<Period>("15").is_err());
        assert_eq!(
            serde_json::to_string(&DayCode::Thu).unwrap(),
            "\"R\"".to_string()
        );
    }
}
