//! 课程时间字符串的解析
//!
//! - [`token`]：`"M56R2"` 这样的星期 + 节次序列
//! - [`classroom`]：`"ED201[GF]"` 这样的教室代码
//! - [`composite`]：逗号分隔的 `"时间-教室"` 组合
//! - [`numeric`]：`day_codes` / `time_codes` 数字编码的适配器

pub mod classroom;
pub mod composite;
pub mod numeric;
pub mod token;

pub use classroom::parse_classroom_token;
pub use composite::{parse_time_classroom, parse_time_classroom_with};
pub use numeric::parse_numeric_codes;
pub use token::parse_schedule_token;

use crate::{Course, CourseRecord, CourseSchedule, building::BuildingDirectory};

/// 根据记录中可用的字段解析课程时间
///
/// 优先使用合并格式 `time_classroom`，其次是数字编码；都没有时返回 None。
///
/// 合并格式中没有可识别的时间（如 `"TBA"`）时同样尝试数字编码，
/// 数字编码也不可用才保留合并格式的空结果。
pub fn parse_record_schedule(
    record: &CourseRecord,
    directory: &BuildingDirectory,
) -> Option<CourseSchedule> {
    let combined = record
        .time_classroom
        .as_deref()
        .and_then(|raw| parse_time_classroom_with(raw, directory));
    if let Some(schedule) = combined.as_ref().filter(|s| !s.is_empty()) {
        return Some(schedule.clone());
    }

    let numeric = match (record.day_codes.as_deref(), record.time_codes.as_deref()) {
        (Some(days), Some(times)) => parse_numeric_codes(
            days,
            times,
            record.classroom_codes.as_deref(),
            directory,
        ),
        _ => None,
    };

    match numeric {
        Some(schedule) if !schedule.is_empty() => Some(schedule),
        numeric => combined.or(numeric),
    }
}

impl CourseRecord {
    /// 转换为已解析的课程，没有可用时间时得到空的 [`CourseSchedule`]
    pub fn into_course(self, directory: &BuildingDirectory) -> Course {
        let schedule = parse_record_schedule(&self, directory).unwrap_or_else(|| {
            tracing::debug!("Course {} has no schedule string", self.id);
            CourseSchedule::empty()
        });
        self.with_schedule(schedule)
    }

    pub(crate) fn with_schedule(self, schedule: CourseSchedule) -> Course {
        Course {
            id: self.id,
            number: self.number,
            name: self.name,
            instructor: self.instructor,
            credits: self.credits,
            schedule,
        }
    }
}
