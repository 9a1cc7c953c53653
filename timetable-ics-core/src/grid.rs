use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Course, CourseId, DayCode, Period};

const DAY_COUNT: usize = DayCode::ALL.len();

/// 默认调色板
const DEFAULT_PALETTE: [&str; 10] = [
    "#4E79A7", "#F28E2B", "#E15759", "#76B7B2", "#59A14F", "#EDC948", "#B07AA1", "#FF9DA7",
    "#9C755F", "#BAB0AC",
];

/// 网格生成选项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridOptions {
    /// 颜色按 "选课顺序 mod 调色板长度" 分配
    pub palette: Vec<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl GridOptions {
    /// 第 index 门已选课程的颜色，调色板为空时没有颜色
    pub fn color_for(&self, index: usize) -> Option<&str> {
        if self.palette.is_empty() {
            return None;
        }
        self.palette
            .get(index % self.palette.len())
            .map(String::as_str)
    }
}

/// 网格中的一个 (星期, 节次) 单元格
///
/// 一段连续节次 p..q 只有首格 `is_block_start = true` 且 `row_span = q-p+1`，
/// 其余格子 `row_span = 0`，渲染时应跳过。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimetableCell {
    pub occupant: Option<CourseId>,
    pub row_span: u8,
    pub is_block_start: bool,
    pub color: Option<String>,
    /// 教室展示名
    pub classroom: Option<String>,
    /// 所有占用该格的课程，按放置顺序，第一个即 occupant
    pub claimants: Vec<CourseId>,
}

impl TimetableCell {
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn has_collision(&self) -> bool {
        self.claimants.len() > 1
    }
}

/// 课程与颜色
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub course_id: CourseId,
    pub name: String,
    pub selection_index: usize,
    pub color: Option<String>,
}

/// 网格中的一处冲突
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCollision {
    pub day: DayCode,
    pub period: Period,
    pub claimants: Vec<CourseId>,
}

/// 7 天 x 14 节的课表网格，下标为 `[day][period - 1]`
#[derive(Debug, Clone, Serialize)]
pub struct TimetableGrid {
    cells: [[TimetableCell; Period::COUNT]; DAY_COUNT],
    legend: Vec<LegendEntry>,
}

impl TimetableGrid {
    fn empty() -> Self {
        Self {
            cells: std::array::from_fn(|_| std::array::from_fn(|_| TimetableCell::default())),
            legend: Vec::new(),
        }
    }

    pub fn cell(&self, day: DayCode, period: Period) -> &TimetableCell {
        &self.cells[day.index()][period.row()]
    }

    /// 某一天的全部格子，按节次排列
    pub fn column(&self, day: DayCode) -> &[TimetableCell] {
        &self.cells[day.index()]
    }

    pub fn cells(&self) -> &[[TimetableCell; Period::COUNT]; DAY_COUNT] {
        &self.cells
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    pub fn collisions(&self) -> Vec<GridCollision> {
        let mut collisions = Vec::new();
        for day in DayCode::ALL {
            for period in Period::all() {
                let cell = self.cell(day, period);
                if cell.has_collision() {
                    collisions.push(GridCollision {
                        day,
                        period,
                        claimants: cell.claimants.clone(),
                    });
                }
            }
        }
        collisions
    }

    /// 纯文本课表；`|` 表示延续格，`*` 表示冲突
    pub fn render_text(&self) -> String {
        const WIDTH: usize = 10;
        let mut out = String::new();

        out.push_str(&format!("{:>4} ", ""));
        for day in DayCode::ALL {
            out.push_str(&format!(
                "|{:^width$}",
                day.name_en().get(..3).unwrap_or(""),
                width = WIDTH
            ));
        }
        out.push_str("|\n");

        for period in Period::all() {
            out.push_str(&format!("{:>4} ", period.get()));
            for day in DayCode::ALL {
                let cell = self.cell(day, period);
                let text = match (&cell.occupant, cell.is_block_start) {
                    (None, _) => String::new(),
                    (Some(id), true) => truncate(id, WIDTH - 1),
                    (Some(_), false) => "|".to_string(),
                };
                let marker = if cell.has_collision() { "*" } else { "" };
                out.push_str(&format!(
                    "|{:^width$}",
                    format!("{}{}", text, marker),
                    width = WIDTH
                ));
            }
            out.push_str("|\n");
        }
        out
    }

    fn place_run(
        &mut self,
        day: DayCode,
        run: &[Period],
        course: &Course,
        color: Option<&str>,
        classroom: Option<&str>,
    ) {
        let Some(first) = run.first() else {
            return;
        };
        let column = &mut self.cells[day.index()];
        for (offset, period) in run.iter().enumerate() {
            let is_start = period == first;
            column[period.row()] = TimetableCell {
                occupant: Some(course.id.clone()),
                row_span: if is_start { (run.len() - offset) as u8 } else { 0 },
                is_block_start: is_start,
                color: color.map(str::to_string),
                classroom: classroom.map(str::to_string),
                claimants: vec![course.id.clone()],
            };
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// 把已选课程投影到课表网格
///
/// 课程按切片顺序放置。同一格被多门课占用时保留先放置的课程，
/// 后来者记入 `claimants`；被占格打断的区段拆成多个独立的块。
pub fn build_grid(courses: &[Course], options: &GridOptions) -> TimetableGrid {
    let mut grid = TimetableGrid::empty();
    let mut seen: HashSet<&str> = HashSet::new();

    for course in courses {
        if !seen.insert(course.id.as_str()) {
            tracing::debug!("Course {} selected twice, placing once", course.id);
            continue;
        }

        let selection_index = grid.legend.len();
        let color = options.color_for(selection_index);
        grid.legend.push(LegendEntry {
            course_id: course.id.clone(),
            name: course.name.clone(),
            selection_index,
            color: color.map(str::to_string),
        });

        for (_, block, meeting) in course.schedule.meetings() {
            let classroom = block.classroom.as_ref().map(|c| c.display_name.as_str());

            for run in meeting.runs() {
                let mut segment: Vec<Period> = Vec::new();

                for period in (run.start().get()..=run.end().get()).filter_map(Period::new) {
                    let cell = &mut grid.cells[meeting.day.index()][period.row()];
                    match cell.occupant.as_deref() {
                        None => {
                            segment.push(period);
                            continue;
                        }
                        Some(owner) if owner == course.id => {}
                        Some(owner) => {
                            tracing::warn!(
                                "Course {} collides with {} on {} period {}",
                                course.id,
                                owner,
                                meeting.day,
                                period
                            );
                            if !cell.claimants.contains(&course.id) {
                                cell.claimants.push(course.id.clone());
                            }
                        }
                    }
                    grid.place_run(meeting.day, &segment, course, color, classroom);
                    segment.clear();
                }
                grid.place_run(meeting.day, &segment, course, color, classroom);
            }
        }
    }

    grid
}
