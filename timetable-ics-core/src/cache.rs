use std::collections::HashMap;

use crate::{
    Course, CourseRecord, CourseSchedule, building::BuildingDirectory,
    schedule::parse_record_schedule,
};

/// 按原始字符串缓存解析结果
///
/// 解析结果只由输入字符串决定，因此除了 "字符串变化就重新解析" 之外不需要失效策略。
pub struct ScheduleCache {
    directory: BuildingDirectory,
    entries: HashMap<String, Option<CourseSchedule>>,
    hits: usize,
}

impl ScheduleCache {
    pub fn new(directory: BuildingDirectory) -> Self {
        Self {
            directory,
            entries: HashMap::new(),
            hits: 0,
        }
    }

    /// 缓存键同时包含编码格式，避免两种格式的字符串相互覆盖
    ///
    /// 合并格式无法识别时会退回数字编码，所以两者都存在时键同时包含两者。
    pub fn cache_key(record: &CourseRecord) -> String {
        let numeric = format!(
            "num:{}|{}|{}",
            record.day_codes.as_deref().unwrap_or(""),
            record.time_codes.as_deref().unwrap_or(""),
            record.classroom_codes.as_deref().unwrap_or("")
        );
        let has_numeric = record.day_codes.is_some() && record.time_codes.is_some();

        match record.time_classroom.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() && has_numeric => format!("tc:{}|{}", raw, numeric),
            Some(raw) if !raw.is_empty() => format!("tc:{}", raw),
            _ => numeric,
        }
    }

    /// 取缓存的解析结果，没有则解析并写入
    pub fn get_or_parse(&mut self, record: &CourseRecord) -> Option<&CourseSchedule> {
        let key = Self::cache_key(record);
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            let schedule = parse_record_schedule(record, &self.directory);
            self.entries.insert(key.clone(), schedule);
        }
        self.entries.get(&key).and_then(Option::as_ref)
    }

    /// 批量转换记录，保持输入顺序
    pub fn load_courses(&mut self, records: Vec<CourseRecord>) -> Vec<Course> {
        records
            .into_iter()
            .map(|record| {
                let schedule = self
                    .get_or_parse(&record)
                    .cloned()
                    .unwrap_or_else(CourseSchedule::empty);
                record.with_schedule(schedule)
            })
            .collect()
    }

    pub fn directory(&self) -> &BuildingDirectory {
        &self.directory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }
}

impl Default for ScheduleCache {
    fn default() -> Self {
        Self::new(BuildingDirectory::default())
    }
}
