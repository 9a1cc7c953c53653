use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::{Course, CourseId, DayCode, Period};

/// 两门课在同一天的节次冲突
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictPair {
    /// 字典序较小的课程
    pub course_a: CourseId,
    pub course_b: CourseId,
    pub day: DayCode,
    pub overlapping_periods: Vec<Period>,
}

impl ConflictPair {
    pub fn involves(&self, course_id: &str) -> bool {
        self.course_a == course_id || self.course_b == course_id
    }

    /// 另一门课；不涉及该课程时返回 None
    pub fn other(&self, course_id: &str) -> Option<&str> {
        if self.course_a == course_id {
            Some(&self.course_b)
        } else if self.course_b == course_id {
            Some(&self.course_a)
        } else {
            None
        }
    }
}

/// 检测已选课程之间的时间冲突
///
/// 对每一对课程、每一对时间块、同一天的每一对上课信息求节次交集。
/// 相邻但不重叠的节次（如 `[1,2]` 与 `[3,4]`）不算冲突。
/// 同一对课程在同一天只报告一次，节次取并集；结果与选课顺序无关。
pub fn detect_conflicts(courses: &[Course]) -> Vec<ConflictPair> {
    let mut seen: HashSet<&str> = HashSet::new();
    let selected: Vec<&Course> = courses
        .iter()
        .filter(|course| {
            let first = seen.insert(course.id.as_str());
            if !first {
                tracing::debug!("Ignoring duplicate selection of course {}", course.id);
            }
            first
        })
        .collect();

    let mut found: BTreeMap<(&str, &str, DayCode), BTreeSet<Period>> = BTreeMap::new();

    for (i, a) in selected.iter().enumerate() {
        for b in &selected[i + 1..] {
            let (first, second) = if a.id <= b.id { (a, b) } else { (b, a) };

            for (_, _, meeting_a) in first.schedule.meetings() {
                for (_, _, meeting_b) in second.schedule.meetings() {
                    if meeting_a.day != meeting_b.day {
                        continue;
                    }
                    let overlap: Vec<Period> = meeting_a
                        .periods
                        .intersection(&meeting_b.periods)
                        .copied()
                        .collect();
                    if overlap.is_empty() {
                        continue;
                    }
                    found
                        .entry((first.id.as_str(), second.id.as_str(), meeting_a.day))
                        .or_default()
                        .extend(overlap);
                }
            }
        }
    }

    let conflicts: Vec<ConflictPair> = found
        .into_iter()
        .map(|((course_a, course_b, day), periods)| ConflictPair {
            course_a: course_a.to_string(),
            course_b: course_b.to_string(),
            day,
            overlapping_periods: periods.into_iter().collect(),
        })
        .collect();

    if !conflicts.is_empty() {
        tracing::debug!(
            "Detected {} conflicts among {} courses",
            conflicts.len(),
            selected.len()
        );
    }
    conflicts
}

/// 与指定课程相关的冲突
pub fn conflicts_for<'a>(
    conflicts: &'a [ConflictPair],
    course_id: &'a str,
) -> impl Iterator<Item = &'a ConflictPair> + 'a {
    conflicts
        .iter()
        .filter(move |conflict| conflict.involves(course_id))
}
