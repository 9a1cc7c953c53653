use std::{path::Path, sync::OnceLock};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{Error, Period, Result};

/// 默认作息表 (开始, 结束)，按分钟计
const DEFAULT_PERIOD_TIMES: [(u32, u32); Period::COUNT] = [
    (8 * 60, 8 * 60 + 50),         // 第1节: 08:00-08:50
    (9 * 60, 9 * 60 + 50),         // 第2节: 09:00-09:50
    (10 * 60 + 10, 11 * 60),       // 第3节: 10:10-11:00
    (11 * 60 + 10, 12 * 60),       // 第4节: 11:10-12:00
    (12 * 60 + 20, 13 * 60 + 10),  // 第5节: 12:20-13:10
    (13 * 60 + 20, 14 * 60 + 10),  // 第6节: 13:20-14:10
    (14 * 60 + 20, 15 * 60 + 10),  // 第7节: 14:20-15:10
    (15 * 60 + 30, 16 * 60 + 20),  // 第8节: 15:30-16:20
    (16 * 60 + 30, 17 * 60 + 20),  // 第9节: 16:30-17:20
    (17 * 60 + 30, 18 * 60 + 20),  // 第10节: 17:30-18:20
    (18 * 60 + 30, 19 * 60 + 20),  // 第11节: 18:30-19:20
    (19 * 60 + 30, 20 * 60 + 20),  // 第12节: 19:30-20:20
    (20 * 60 + 30, 21 * 60 + 20),  // 第13节: 20:30-21:20
    (21 * 60 + 30, 22 * 60 + 20),  // 第14节: 21:30-22:20
];

/// 单节课的起止时间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTime {
    pub period: Period,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

/// 节次 -> 上下课时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTable {
    times: [PeriodTime; Period::COUNT],
}

impl PeriodTable {
    /// 进程内共享的默认作息表
    pub fn global() -> &'static PeriodTable {
        static TABLE: OnceLock<PeriodTable> = OnceLock::new();
        TABLE.get_or_init(PeriodTable::default)
    }

    /// 由任意顺序的条目构建，要求 14 节齐全且开始早于结束
    pub fn from_entries(entries: Vec<PeriodTime>) -> Result<Self> {
        let mut slots: [Option<PeriodTime>; Period::COUNT] = [None; Period::COUNT];

        for entry in entries {
            if entry.start >= entry.end {
                return Err(Error::Config(format!(
                    "period {} starts at {} but ends at {}",
                    entry.period, entry.start, entry.end
                )));
            }
            let slot = &mut slots[entry.period.row()];
            if slot.is_some() {
                return Err(Error::Config(format!(
                    "period {} is defined more than once",
                    entry.period
                )));
            }
            *slot = Some(entry);
        }

        let mut times = Vec::with_capacity(Period::COUNT);
        for (period, slot) in Period::all().zip(slots) {
            times.push(slot.ok_or(Error::UnknownPeriod(period.get()))?);
        }
        let times: [PeriodTime; Period::COUNT] = times
            .try_into()
            .map_err(|_| Error::Config("period table has wrong length".to_string()))?;

        Ok(Self { times })
    }

    /// 从JSON加载：`[{"period":1,"start":"08:00","end":"08:50"}, ...]`
    pub fn from_json(json_data: &str) -> Result<Self> {
        let entries: Vec<PeriodTime> = serde_json::from_str(json_data)?;
        Self::from_entries(entries)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref).map_err(|err| {
            Error::Config(format!(
                "cannot read period table {}: {}",
                path_ref.display(),
                err
            ))
        })?;
        let table = Self::from_json(&content)?;
        tracing::info!("Loaded period table from {}", path_ref.display());
        Ok(table)
    }

    pub fn get(&self, period: Period) -> &PeriodTime {
        &self.times[period.row()]
    }

    pub fn start(&self, period: Period) -> NaiveTime {
        self.get(period).start
    }

    pub fn end(&self, period: Period) -> NaiveTime {
        self.get(period).end
    }

    pub fn entries(&self) -> &[PeriodTime] {
        &self.times
    }

    pub fn export_to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.times)?)
    }
}

impl Default for PeriodTable {
    fn default() -> Self {
        let times = std::array::from_fn(|row| {
            let (start, end) = DEFAULT_PERIOD_TIMES[row];
            PeriodTime {
                period: Period::new(row as u8 + Period::MIN).expect("row within period range"),
                start: minutes_to_time(start),
                end: minutes_to_time(end),
            }
        });
        Self { times }
    }
}

fn minutes_to_time(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let value = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&value, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&value, "%H:%M:%S"))
            .map_err(|e| D::Error::custom(format!("invalid time '{}': {}", value, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(index: u8) -> Period {
        Period::new(index).unwrap()
    }

    #[test]
    fn test_default_table() {
        let table = PeriodTable::default();
        assert_eq!(table.start(p(1)), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(table.end(p(6)), NaiveTime::from_hms_opt(14, 10, 0).unwrap());
        assert_eq!(table.end(p(14)), NaiveTime::from_hms_opt(22, 20, 0).unwrap());
        for pair in table.entries().windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let table = PeriodTable::default();
        let json = table.export_to_json().unwrap();
        assert!(json.contains("\"08:00\""));
        assert_eq!(PeriodTable::from_json(&json).unwrap(), table);
    }

    #[test]
    fn test_missing_period_rejected() {
        let entries: Vec<PeriodTime> = PeriodTable::default()
            .entries()
            .iter()
            .copied()
            .filter(|entry| entry.period.get() != 7)
            .collect();
        assert!(matches!(
            PeriodTable::from_entries(entries),
            Err(Error::UnknownPeriod(7))
        ));
    }

    #[test]
    fn test_inverted_period_rejected() {
        let mut entries = PeriodTable::default().entries().to_vec();
        entries[0].end = entries[0].start;
        assert!(matches!(
            PeriodTable::from_entries(entries),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_out_of_range_period_in_json() {
        let json = r#"[{"period":15,"start":"08:00","end":"08:50"}]"#;
        assert!(matches!(PeriodTable::from_json(json), Err(Error::Json(_))));
    }
}
