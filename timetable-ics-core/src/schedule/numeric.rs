//! 数字编码格式的适配器
//!
//! 部分数据源给出的是两列：`day_codes`（1-7 代表星期一到星期日）与
//! `time_codes`（`1`-`9` 以及 `A`-`F` 代表节次），两列以逗号对应。
//! 这里把它们转换为统一的 [`CourseSchedule`]。

use std::collections::BTreeSet;

use crate::{
    CourseSchedule, DayCode, Meeting, Period, ScheduleBlock, building::BuildingDirectory,
};

/// 解析一个节次字符：`1`-`9` -> 1-9，`A`-`F` -> 10-15（超出 14 的会被丢弃）
fn slot_to_period(slot: char) -> Option<Period> {
    let index = slot.to_digit(16)?;
    if index == 0 {
        return None;
    }
    Period::new(index as u8)
}

fn split_entries(codes: &str) -> Vec<&str> {
    codes
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// 将数字编码转换为课程时间
///
/// 第 i 个星期条目与第 i 个节次条目配对；节次只有一个条目时套用到所有星期。
/// 两列都为空时返回 None。
pub fn parse_numeric_codes(
    day_codes: &str,
    time_codes: &str,
    classroom: Option<&str>,
    directory: &BuildingDirectory,
) -> Option<CourseSchedule> {
    if day_codes.trim().is_empty() && time_codes.trim().is_empty() {
        return None;
    }

    let day_entries = split_entries(day_codes);
    let time_entries = split_entries(time_codes);
    let mut days: Vec<(DayCode, BTreeSet<Period>)> = Vec::new();

    for (i, day_entry) in day_entries.iter().enumerate() {
        let time_entry = match time_entries.len() {
            1 => time_entries[0],
            _ => match time_entries.get(i) {
                Some(entry) => entry,
                None => {
                    tracing::debug!("No time codes for day entry {:?}", day_entry);
                    continue;
                }
            },
        };

        let periods: BTreeSet<Period> = time_entry
            .chars()
            .filter_map(|slot| {
                let period = slot_to_period(slot.to_ascii_uppercase());
                if period.is_none() {
                    tracing::debug!("Dropping time code {:?}", slot);
                }
                period
            })
            .collect();

        for day in day_entry
            .chars()
            .filter_map(|c| c.to_digit(10).and_then(DayCode::from_number))
        {
            match days.iter_mut().find(|(d, _)| *d == day) {
                Some((_, existing)) => existing.extend(periods.iter().copied()),
                None => days.push((day, periods.clone())),
            }
        }
    }

    let meetings: Vec<Meeting> = days
        .into_iter()
        .filter_map(|(day, periods)| Meeting::new(day, periods))
        .collect();

    let blocks = if meetings.is_empty() {
        Vec::new()
    } else {
        vec![ScheduleBlock {
            meetings,
            classroom: classroom.and_then(|raw| directory.parse_classroom(raw)),
        }]
    };

    Some(CourseSchedule {
        blocks,
        source: format!("{}|{}", day_codes.trim(), time_codes.trim()),
    })
}
