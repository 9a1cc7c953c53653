use std::collections::BTreeSet;

use crate::{DayCode, Meeting, Period};

/// 解析一段 "星期字母 + 节次数字" 的课程时间，如 `"M56R2"`
///
/// 每个出现过的星期对应一个 [`Meeting`]，按首次出现的顺序排列；
/// 同一字母再次出现时合并节次。无法识别的字符会被丢弃，不会报错。
///
/// 节次的切分规则：若接下来两个字符组成 10..=14 的数字则作为一个节次，
/// 否则取一个字符作为 1..=9 的节次，否则结束当天的节次序列。
pub fn parse_schedule_token(raw: &str) -> Vec<Meeting> {
    let chars: Vec<char> = raw.trim().chars().collect();
    let mut days: Vec<(DayCode, BTreeSet<Period>)> = Vec::new();
    let mut current: Option<usize> = None;
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];

        if let Some(day) = DayCode::from_letter(c) {
            let index = match days.iter().position(|(d, _)| *d == day) {
                Some(index) => index,
                None => {
                    days.push((day, BTreeSet::new()));
                    days.len() - 1
                }
            };
            current = Some(index);
            pos += 1;
            continue;
        }

        if let Some(index) = current {
            if let Some((period, consumed)) = next_period(&chars[pos..]) {
                days[index].1.insert(period);
                pos += consumed;
                continue;
            }
        }

        tracing::debug!("Dropping unexpected character {:?} at {} in {:?}", c, pos, raw);
        current = None;
        pos += 1;
    }

    days.into_iter()
        .filter_map(|(day, periods)| {
            if periods.is_empty() {
                tracing::debug!("Day {} in {:?} has no periods, skipped", day, raw);
            }
            Meeting::new(day, periods)
        })
        .collect()
}

/// 贪心读取下一个节次，返回 (节次, 消耗字符数)
fn next_period(rest: &[char]) -> Option<(Period, usize)> {
    let first = rest.first()?.to_digit(10)?;

    if let Some(second) = rest.get(1).and_then(|c| c.to_digit(10)) {
        let two_digit = first * 10 + second;
        if (10..=u32::from(Period::MAX)).contains(&two_digit) {
            return Period::new(two_digit as u8).map(|period| (period, 2));
        }
    }

    (1..=9)
        .contains(&first)
        .then(|| Period::new(first as u8))
        .flatten()
        .map(|period| (period, 1))
}
