use crate::{CourseSchedule, ScheduleBlock, building::BuildingDirectory};

use super::token::parse_schedule_token;

/// 解析合并格式的时间教室字符串，如 `"M56R2-ED201[GF]"` 或 `"W12-EC114,R34-SC101"`
///
/// 每个逗号分隔段落生成一个独立的 [`ScheduleBlock`]，保留各自的教室。
/// 只有空输入返回 None；无法识别的内容得到 `blocks` 为空的结果。
pub fn parse_time_classroom_with(
    raw: &str,
    directory: &BuildingDirectory,
) -> Option<CourseSchedule> {
    let source = raw.trim();
    if source.is_empty() {
        return None;
    }

    let blocks = source
        .split(',')
        .filter_map(|segment| parse_segment(segment, directory))
        .collect();

    Some(CourseSchedule {
        blocks,
        source: source.to_string(),
    })
}

/// 使用默认楼栋目录解析
pub fn parse_time_classroom(raw: &str) -> Option<CourseSchedule> {
    parse_time_classroom_with(raw, BuildingDirectory::global())
}

fn parse_segment(segment: &str, directory: &BuildingDirectory) -> Option<ScheduleBlock> {
    let segment = segment.trim();
    let (schedule_part, classroom_part) = match segment.split_once('-') {
        Some((schedule, classroom)) => (schedule, Some(classroom)),
        None => (segment, None),
    };

    let meetings = parse_schedule_token(schedule_part);
    if meetings.is_empty() {
        tracing::debug!("Segment {:?} has no recognizable meetings", segment);
        return None;
    }

    Some(ScheduleBlock {
        meetings,
        classroom: classroom_part.and_then(|raw| directory.parse_classroom(raw)),
    })
}
