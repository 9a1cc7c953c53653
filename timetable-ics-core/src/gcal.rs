//! Google Calendar 模板链接
//!
//! 模板链接没有可用的每周重复参数，因此每个链接只表示第一次上课。

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;

use crate::{Classroom, Course, CourseId, DayCode, Error, Result};

const GOOGLE_CALENDAR_RENDER: &str = "https://calendar.google.com/calendar/render";

/// 生成单个链接所需的上下文
#[derive(Debug, Clone, Copy)]
pub struct MeetingContext<'a> {
    pub course: &'a Course,
    pub classroom: Option<&'a Classroom>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// 纯文本描述，未转义
    pub details: &'a str,
}

/// 某次上课的 Google Calendar 链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleCalendarLink {
    pub course_id: CourseId,
    pub block_index: usize,
    pub day: DayCode,
    pub url: String,
}

/// UTC 基本格式，如 `20241021T042000Z`
pub fn format_utc(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}

/// `https://calendar.google.com/calendar/render?action=TEMPLATE&text=...&dates=...`
pub fn google_calendar_url(context: &MeetingContext<'_>) -> Result<String> {
    let mut url = Url::parse(GOOGLE_CALENDAR_RENDER)
        .map_err(|e| Error::LinkGeneration(format!("invalid base URL: {}", e)))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("action", "TEMPLATE")
            .append_pair("text", &context.course.name)
            .append_pair(
                "dates",
                &format!("{}/{}", format_utc(&context.start), format_utc(&context.end)),
            );
        if let Some(classroom) = context.classroom {
            query.append_pair("location", &classroom.display_name);
        }
        query.append_pair("details", context.details);
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::parse_time_classroom;
    use chrono::TimeZone;

    #[test]
    fn test_url_fields_encoded() {
        let course = Course {
            id: "42".to_string(),
            number: "CS2001".to_string(),
            name: "Data Structures, Lab; A&B".to_string(),
            instructor: Some("Chen".to_string()),
            credits: Some(3.0),
            schedule: parse_time_classroom("M56-ED201[GF]").unwrap(),
        };
        let block = &course.schedule.blocks[0];
        let context = MeetingContext {
            course: &course,
            classroom: block.classroom.as_ref(),
            start: Utc.with_ymd_and_hms(2024, 10, 21, 4, 20, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 10, 21, 6, 10, 0).unwrap(),
            details: "CS2001\nChen",
        };

        let url = google_calendar_url(&context).unwrap();
        assert!(url.starts_with(
            "https://calendar.google.com/calendar/render?action=TEMPLATE&text="
        ));
        assert!(url.contains("text=Data+Structures%2C+Lab%3B+A%26B"));
        assert!(url.contains("dates=20241021T042000Z%2F20241021T061000Z"));
        assert!(url.contains("location=ED201"));
        assert!(url.contains("details=CS2001%0AChen"));
        assert!(!url.contains("RRULE"));
    }

    #[test]
    fn test_location_omitted_without_classroom() {
        let course = Course {
            id: "7".to_string(),
            number: String::new(),
            name: "Seminar".to_string(),
            instructor: None,
            credits: None,
            schedule: parse_time_classroom("F9").unwrap(),
        };
        let context = MeetingContext {
            course: &course,
            classroom: None,
            start: Utc.with_ymd_and_hms(2024, 10, 25, 8, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 10, 25, 9, 20, 0).unwrap(),
            details: "",
        };
        let url = google_calendar_url(&context).unwrap();
        assert!(!url.contains("location="));
        assert!(url.contains("text=Seminar"));
    }
}
