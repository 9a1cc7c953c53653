use super::*;
use crate::{Course, schedule::parse_time_classroom, semester::AcademicTerm};
use chrono::{TimeZone, Utc};
use ical::parser::ical::IcalParser;
use std::io::BufReader;

fn course(id: &str, name: &str, raw: &str) -> Course {
    Course {
        id: id.to_string(),
        number: format!("CS{}", id),
        name: name.to_string(),
        instructor: Some("张老师".to_string()),
        credits: Some(3.0),
        schedule: parse_time_classroom(raw).expect("schedule should parse"),
    }
}

/// 2024-10-20 08:00 (+08:00)，星期日
fn sunday_morning() -> ExportOptions {
    ExportOptions::at(Utc.with_ymd_and_hms(2024, 10, 20, 0, 0, 0).unwrap())
}

fn property_values<'a>(ics: &'a str, name: &str) -> Vec<&'a str> {
    let prefix = format!("{}:", name);
    ics.split("\r\n")
        .filter_map(|line| line.strip_prefix(prefix.as_str()))
        .collect()
}

fn unescape(value: &str) -> String {
    let mut out = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') | Some('N') => out.push('\n'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[test]
fn test_empty_calendar_is_well_formed() {
    let exporter = IcsExporter::new(sunday_morning());
    let ics = exporter.to_icalendar(&[]).unwrap();

    assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
    assert!(ics.ends_with("END:VCALENDAR\r\n"));
    assert!(!ics.contains("BEGIN:VEVENT"));
    assert!(ics.contains("X-WR-CALNAME:课程表"));
    assert!(ics.contains("X-WR-TIMEZONE:Asia/Taipei"));
}

#[test]
fn test_one_event_per_meeting() {
    let courses = vec![
        course("1", "编译原理", "M56R2-ED201[GF]"),
        course("2", "Operating Systems", "W12-EC114,R34-SC101"),
    ];
    let exporter = IcsExporter::new(sunday_morning());
    let ics = exporter.to_icalendar(&courses).unwrap();

    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 4);
    assert_eq!(ics.matches("END:VEVENT").count(), 4);
    assert_eq!(ics.matches("BEGIN:VALARM").count(), 4);
    assert!(ics.contains("TRIGGER:-PT10M"));
    assert_eq!(property_values(&ics, "LOCATION"), vec!["ED201", "ED201", "EC114", "SC101"]);
}

#[test]
fn test_first_occurrence_after_reference() {
    let courses = vec![course("1", "编译原理", "M56R2-ED201[GF]")];
    let exporter = IcsExporter::new(sunday_morning());
    let ics = exporter.to_icalendar(&courses).unwrap();

    assert_eq!(
        property_values(&ics, "DTSTART"),
        vec!["20241021T042000Z", "20241024T010000Z"]
    );
    assert_eq!(
        property_values(&ics, "DTEND"),
        vec!["20241021T061000Z", "20241024T015000Z"]
    );
    assert_eq!(property_values(&ics, "DTSTAMP"), vec!["20241020T000000Z"; 2]);
}

#[test]
fn test_same_day_meeting_not_yet_started() {
    // 星期一 10:00 (+08:00)
    let options = ExportOptions::at(Utc.with_ymd_and_hms(2024, 10, 21, 2, 0, 0).unwrap());
    let exporter = IcsExporter::new(options);

    let morning = course("1", "Calculus", "M23");
    let (start, end) = exporter
        .first_occurrence(&morning.schedule.blocks[0].meetings[0])
        .unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 10, 28, 1, 0, 0).unwrap());
    assert_eq!(end, Utc.with_ymd_and_hms(2024, 10, 28, 3, 0, 0).unwrap());

    let afternoon = course("2", "Physics", "M56");
    let (start, _) = exporter
        .first_occurrence(&afternoon.schedule.blocks[0].meetings[0])
        .unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 10, 21, 4, 20, 0).unwrap());
}

#[test]
fn test_non_contiguous_meeting_spans_whole_range() {
    let courses = vec![course("1", "Lab", "F2356")];
    let exporter = IcsExporter::new(sunday_morning());
    let ics = exporter.to_icalendar(&courses).unwrap();

    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    assert_eq!(property_values(&ics, "DTSTART"), vec!["20241025T010000Z"]);
    assert_eq!(property_values(&ics, "DTEND"), vec!["20241025T061000Z"]);

    // 空档（第 4 节）不算上课，描述里列出实际时间
    let meeting = &courses[0].schedule.blocks[0].meetings[0];
    let description = exporter.build_course_description(&courses[0], meeting);
    assert!(description.ends_with("节次: 星期五 2-3, 5-6\n上课时间: 09:00-11:00, 12:20-14:10"));
    let unfolded = ics.replace("\r\n ", "");
    assert!(unfolded.contains("上课时间: 09:00-11:00\\, 12:20-14:10\r\n"));
}

#[test]
fn test_rrule_uses_term_weeks() {
    let mut options = sunday_morning();
    options.term_weeks = 16;
    let exporter = IcsExporter::new(options);
    let ics = exporter
        .to_icalendar(&[course("1", "Calculus", "T34")])
        .unwrap();

    assert_eq!(property_values(&ics, "RRULE"), vec!["FREQ=WEEKLY;COUNT=16"]);
}

#[test]
fn test_zero_term_weeks_rejected() {
    let mut options = sunday_morning();
    options.term_weeks = 0;
    let exporter = IcsExporter::new(options);

    let result = exporter.to_icalendar(&[course("1", "Calculus", "T34")]);
    assert!(matches!(result, Err(Error::Config(_))));
    assert!(exporter.google_calendar_links(&[]).is_err());
}

#[test]
fn test_uid_stable_across_exports() {
    let courses = vec![
        course("1", "编译原理", "M56R2-ED201[GF]"),
        course("2", "Operating Systems", "W12-EC114,R34-SC101"),
    ];

    let first = IcsExporter::new(sunday_morning())
        .to_icalendar(&courses)
        .unwrap();
    // 参照时间不同，UID 不变
    let later = ExportOptions {
        reference_time: Utc.with_ymd_and_hms(2024, 11, 3, 0, 0, 0).unwrap(),
        ..sunday_morning()
    };
    let second = IcsExporter::new(later).to_icalendar(&courses).unwrap();

    let uids = property_values(&first, "UID");
    assert_eq!(uids, property_values(&second, "UID"));

    let unique: std::collections::HashSet<_> = uids.iter().collect();
    assert_eq!(unique.len(), uids.len());

    let spring = ExportOptions {
        term: AcademicTerm::new(2024, 2).unwrap(),
        ..sunday_morning()
    };
    let third = IcsExporter::new(spring).to_icalendar(&courses).unwrap();
    assert_ne!(uids, property_values(&third, "UID"));
}

#[test]
fn test_escaped_text_round_trips_through_parser() {
    let name = "Data Structures, Lab; A&B \\ C";
    let courses = vec![course("1", name, "M56-ED201[GF]")];
    let exporter = IcsExporter::new(sunday_morning());
    let ics = exporter.to_icalendar(&courses).unwrap();

    assert!(ics.contains("SUMMARY:Data Structures\\, Lab\\; A&B \\\\ C\r\n"));

    let mut parser = IcalParser::new(BufReader::new(ics.as_bytes()));
    let calendar = parser.next().expect("calendar").expect("parse calendar");
    assert_eq!(calendar.events.len(), 1);

    let event = &calendar.events[0];
    let value = |key: &str| {
        event
            .properties
            .iter()
            .find(|prop| prop.name.eq_ignore_ascii_case(key))
            .and_then(|prop| prop.value.as_deref())
            .map(|v| unescape(v.trim_end_matches('\r')))
    };

    assert_eq!(value("SUMMARY").as_deref(), Some(name));
    assert_eq!(value("LOCATION").as_deref(), Some("ED201"));
    assert_eq!(event.alarms.len(), 1);

    let unfolded = ics.replace("\r\n ", "");
    assert!(unfolded.contains(
        "DESCRIPTION:课程编号: CS1\\n任课教师: 张老师\\n学分: 3\\n节次: 星期一 5-6\r\n"
    ));
}

#[test]
fn test_long_lines_folded() {
    let name = "分布式系统与云计算专题研讨".repeat(8);
    let courses = vec![course("1", &name, "W34")];
    let exporter = IcsExporter::new(sunday_morning());
    let ics = exporter.to_icalendar(&courses).unwrap();

    for line in ics.split("\r\n") {
        assert!(line.len() <= MAX_LINE_OCTETS, "line too long: {}", line);
    }

    let unfolded = ics.replace("\r\n ", "");
    assert!(unfolded.contains(&format!("SUMMARY:{}\r\n", name)));
}

#[test]
fn test_description_unknowns_and_options() {
    let mut bare = course("9", "Seminar", "S1");
    bare.number = String::new();
    bare.instructor = None;
    bare.credits = None;

    let exporter = IcsExporter::new(sunday_morning());
    let description = exporter.build_course_description(&bare, &bare.schedule.blocks[0].meetings[0]);
    assert_eq!(
        description,
        "课程编号: 未知\n任课教师: 未知\n学分: 未知\n节次: 星期六 1"
    );

    let options = ExportOptions {
        include_description: false,
        reminder_minutes: None,
        ..sunday_morning()
    };
    let ics = IcsExporter::new(options).to_icalendar(&[bare]).unwrap();
    assert!(!ics.contains("DESCRIPTION:"));
    assert!(!ics.contains("BEGIN:VALARM"));
    assert!(!ics.contains("LOCATION:"));
}

#[test]
fn test_google_links_per_meeting() {
    let courses = vec![
        course("1", "编译原理", "M56R2-ED201[GF]"),
        course("2", "Operating Systems", "W12-EC114,R34-SC101"),
        course("3", "Unscheduled", "???"),
    ];
    let exporter = IcsExporter::new(sunday_morning());
    let links = exporter.google_calendar_links(&courses).unwrap();

    assert_eq!(links.len(), 4);
    assert_eq!(links[0].course_id, "1");
    assert_eq!(links[1].day, crate::DayCode::Thu);
    assert_eq!(links[3].block_index, 1);
    assert!(links[0].url.contains("dates=20241021T042000Z%2F20241021T061000Z"));
    assert!(links.iter().all(|link| link.url.contains("action=TEMPLATE")));
}
