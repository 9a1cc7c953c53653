use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    Course, Error, ExportOptions, Meeting, Result, ScheduleBlock,
    gcal::{GoogleCalendarLink, MeetingContext, format_utc, google_calendar_url},
    period::PeriodTable,
};

#[cfg(test)]
mod tests;

/// RFC 5545 建议的单行最大字节数
const MAX_LINE_OCTETS: usize = 75;

/// 日历导出器：iCalendar 文档与 Google Calendar 链接
pub struct IcsExporter {
    options: ExportOptions,
    periods: PeriodTable,
}

impl IcsExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            periods: PeriodTable::global().clone(),
        }
    }

    /// 使用自定义作息表
    pub fn with_periods(mut self, periods: PeriodTable) -> Self {
        self.periods = periods;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// 生成完整的 iCalendar 文档，每门课每个时间块的每次上课一个 VEVENT
    pub fn to_icalendar(&self, courses: &[Course]) -> Result<String> {
        self.options.validate()?;
        let mut ics_content = String::new();

        // ICS文件头部
        push_line(&mut ics_content, "BEGIN:VCALENDAR");
        push_line(&mut ics_content, "VERSION:2.0");
        push_line(&mut ics_content, "PRODID:-//Timetable ICS//Course Calendar//EN");
        push_line(&mut ics_content, "CALSCALE:GREGORIAN");
        push_line(&mut ics_content, "METHOD:PUBLISH");

        if let Some(ref name) = self.options.calendar_name {
            push_line(&mut ics_content, &format!("X-WR-CALNAME:{}", escape_text(name)));
        }

        if let Some(ref timezone) = self.options.timezone {
            push_line(&mut ics_content, &format!("X-WR-TIMEZONE:{}", timezone));
        }

        let mut event_count = 0;
        for course in courses {
            for (block_index, block, meeting) in course.schedule.meetings() {
                self.add_meeting_event(&mut ics_content, course, block_index, block, meeting)?;
                event_count += 1;
            }
        }

        // ICS文件尾部
        push_line(&mut ics_content, "END:VCALENDAR");

        tracing::debug!(
            "Generated {} events for {} courses",
            event_count,
            courses.len()
        );
        Ok(ics_content)
    }

    /// 每次上课一个 Google Calendar 链接，只包含第一次上课
    pub fn google_calendar_links(&self, courses: &[Course]) -> Result<Vec<GoogleCalendarLink>> {
        self.options.validate()?;
        let mut links = Vec::new();

        for course in courses {
            for (block_index, block, meeting) in course.schedule.meetings() {
                let (start, end) = self.first_occurrence(meeting)?;
                let details = self.build_course_description(course, meeting);
                let context = MeetingContext {
                    course,
                    classroom: block.classroom.as_ref(),
                    start,
                    end,
                    details: &details,
                };
                links.push(GoogleCalendarLink {
                    course_id: course.id.clone(),
                    block_index,
                    day: meeting.day,
                    url: google_calendar_url(&context)?,
                });
            }
        }

        Ok(links)
    }

    /// 添加单个上课事件
    fn add_meeting_event(
        &self,
        ics_content: &mut String,
        course: &Course,
        block_index: usize,
        block: &ScheduleBlock,
        meeting: &Meeting,
    ) -> Result<()> {
        let (start, end) = self.first_occurrence(meeting)?;

        push_line(ics_content, "BEGIN:VEVENT");
        push_line(
            ics_content,
            &format!("UID:{}", self.event_uid(course, block_index, meeting)),
        );
        push_line(
            ics_content,
            &format!("DTSTAMP:{}", format_utc(&self.options.reference_time)),
        );
        push_line(ics_content, &format!("DTSTART:{}", format_utc(&start)));
        push_line(ics_content, &format!("DTEND:{}", format_utc(&end)));
        push_line(
            ics_content,
            &format!("RRULE:FREQ=WEEKLY;COUNT={}", self.options.term_weeks),
        );
        push_line(ics_content, &format!("SUMMARY:{}", escape_text(&course.name)));

        if let Some(ref classroom) = block.classroom {
            push_line(
                ics_content,
                &format!("LOCATION:{}", escape_text(&classroom.display_name)),
            );
        }

        if self.options.include_description {
            let description = self.build_course_description(course, meeting);
            push_line(
                ics_content,
                &format!("DESCRIPTION:{}", escape_text(&description)),
            );
        }

        // 添加提醒
        if let Some(reminder_minutes) = self.options.reminder_minutes {
            push_line(ics_content, "BEGIN:VALARM");
            push_line(ics_content, "ACTION:DISPLAY");
            push_line(ics_content, "DESCRIPTION:课程提醒");
            push_line(ics_content, &format!("TRIGGER:-PT{}M", reminder_minutes));
            push_line(ics_content, "END:VALARM");
        }

        push_line(ics_content, "END:VEVENT");

        Ok(())
    }

    /// 同一课程、学年、学期、时间块、星期得到相同的 UID
    pub fn event_uid(&self, course: &Course, block_index: usize, meeting: &Meeting) -> String {
        let key = format!(
            "{}:{}:{}:{}",
            course.id,
            self.options.term.label(),
            block_index,
            meeting.day
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }

    /// 参照时间之后第一次上课的起止时间 (UTC)
    ///
    /// 当天的课若尚未开始则算作第一次。
    pub fn first_occurrence(&self, meeting: &Meeting) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let offset = self.options.offset()?;
        let local_now = self.options.reference_time.with_timezone(&offset);
        let today = local_now.date_naive();

        let start_time = self.periods.start(meeting.first_period());
        let end_time = self.periods.end(meeting.last_period());

        let days_ahead = (meeting.day.weekday().num_days_from_monday() + 7
            - today.weekday().num_days_from_monday())
            % 7;
        let mut date = today + Duration::days(days_ahead as i64);
        if days_ahead == 0 && date.and_time(start_time) <= local_now.naive_local() {
            date += Duration::weeks(1);
        }

        let start = offset
            .from_local_datetime(&date.and_time(start_time))
            .single()
            .ok_or_else(|| Error::IcsGeneration("ambiguous start time".to_string()))?;
        let end = offset
            .from_local_datetime(&date.and_time(end_time))
            .single()
            .ok_or_else(|| Error::IcsGeneration("ambiguous end time".to_string()))?;

        Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
    }

    /// 构建课程描述：课程编号、任课教师、学分、节次
    ///
    /// 节次不连续时事件覆盖整个区间，描述中另外列出实际的上课时间。
    pub fn build_course_description(&self, course: &Course, meeting: &Meeting) -> String {
        let number = if course.number.is_empty() {
            "未知"
        } else {
            course.number.as_str()
        };
        let instructor = course.instructor.as_deref().unwrap_or("未知");
        let credits = course
            .credits
            .map(|c| c.to_string())
            .unwrap_or_else(|| "未知".to_string());

        let mut description = format!(
            "课程编号: {}\n任课教师: {}\n学分: {}\n节次: {} {}",
            number,
            instructor,
            credits,
            meeting.day.name_zh(),
            meeting.period_range_label
        );

        let runs = meeting.runs();
        if runs.len() > 1 {
            let times: Vec<String> = runs
                .iter()
                .map(|run| {
                    format!(
                        "{}-{}",
                        self.periods.start(*run.start()).format("%H:%M"),
                        self.periods.end(*run.end()).format("%H:%M")
                    )
                })
                .collect();
            description.push_str(&format!("\n上课时间: {}", times.join(", ")));
        }

        description
    }
}

impl Default for IcsExporter {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

/// 转义ICS文本内容
pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace("\r\n", "\\n")
        .replace(['\n', '\r'], "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

/// 写入一行内容，超过 75 字节时按 UTF-8 字符边界折行
fn push_line(out: &mut String, line: &str) {
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;

    for c in line.chars() {
        if used + c.len_utf8() > budget {
            out.push_str("\r\n ");
            // 续行的前导空格占一个字节
            budget = MAX_LINE_OCTETS - 1;
            used = 0;
        }
        out.push(c);
        used += c.len_utf8();
    }
    out.push_str("\r\n");
}
