//! Timetable ICS Core Library
//!
//! 解析紧凑的课程时间编码（如 `M56R2-ED201[GF]`），检测选课冲突，
//! 生成一周课表网格，并导出 iCalendar 文件与 Google Calendar 链接。

pub mod building;
pub mod cache;
pub mod config;
pub mod conflict;
pub mod error;
pub mod gcal;
pub mod grid;
pub mod ics;
pub mod period;
pub mod schedule;
pub mod semester;
pub mod types;

// Re-export core types and error handling
pub use error::{Error, Result};
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{
        building::*, cache::*, config::*, conflict::*, gcal::*, grid::*, ics::*, period::*,
        schedule::*, semester::*, types::*,
    };
}
