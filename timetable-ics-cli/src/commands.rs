use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use timetable_ics_core::{
    Course, CourseRecord, ExportOptions,
    cache::ScheduleCache,
    config::ReferenceData,
    conflict::detect_conflicts,
    grid::{GridOptions, build_grid},
    ics::IcsExporter,
    schedule::parse_time_classroom_with,
    semester::AcademicTerm,
};

use crate::{ExportArgs, GridFormat, SelectionArgs};

/// 读取课程目录并按选课顺序取出已选课程
fn load_selected_courses(args: &SelectionArgs, reference: &ReferenceData) -> Result<Vec<Course>> {
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("无法读取课程目录: {}", args.input.display()))?;
    let records: Vec<CourseRecord> = serde_json::from_str(&content)
        .with_context(|| format!("课程目录格式错误: {}", args.input.display()))?;

    let mut cache = ScheduleCache::new(reference.buildings.clone());
    let courses = cache.load_courses(records);
    tracing::debug!(
        "Loaded {} courses, {} distinct schedule strings, {} cache hits",
        courses.len(),
        cache.len(),
        cache.hits()
    );

    Ok(select_courses(courses, &args.select))
}

/// 按给定ID顺序选出课程，未给出ID时保留全部；重复或未知的ID被忽略
fn select_courses(courses: Vec<Course>, selection: &[String]) -> Vec<Course> {
    if selection.is_empty() {
        return courses;
    }

    let mut selected: Vec<Course> = Vec::new();
    for id in selection.iter().map(|id| id.trim()) {
        if selected.iter().any(|c| c.id == id) {
            continue;
        }
        match courses.iter().find(|c| c.id == id) {
            Some(course) => selected.push(course.clone()),
            None => tracing::warn!("课程目录中没有课程 {}", id),
        }
    }
    selected
}

fn warn_unscheduled(courses: &[Course]) {
    for course in courses.iter().filter(|c| c.schedule.is_empty()) {
        tracing::warn!("课程 {} ({}) 没有可用的上课时间", course.id, course.name);
    }
}

/// 构建导出选项：未指定的学年学期由当前日期推算
fn build_export_options(args: &ExportArgs) -> Result<ExportOptions> {
    let mut options = ExportOptions::at(Utc::now());

    if args.year.is_some() || args.semester.is_some() {
        let year = args.year.unwrap_or(options.term.year);
        let semester = args.semester.unwrap_or(options.term.semester.number());
        options.term = AcademicTerm::new(year, semester).map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!("使用用户指定的学期: {}", options.term.label());
    } else {
        tracing::info!("自动检测学期: {}", options.term.label());
    }

    if let Some(name) = args.calendar_name.clone() {
        options.calendar_name = Some(name);
    }
    if let Some(weeks) = args.weeks {
        options.term_weeks = weeks;
    }
    options.reminder_minutes = (args.reminder_minutes > 0).then_some(args.reminder_minutes);

    Ok(options)
}

/// 解析单个编码命令
pub fn parse_command(raw: &str) -> Result<()> {
    let reference = ReferenceData::load(None, None)?;
    let Some(schedule) = parse_time_classroom_with(raw, &reference.buildings) else {
        println!("未能解析: {:?}", raw);
        return Ok(());
    };

    if schedule.is_empty() {
        println!("{:?} 中没有可用的上课时间", raw);
    }
    for (index, block, meeting) in schedule.meetings() {
        let location = block
            .classroom
            .as_ref()
            .map(|c| format!("{} {} ({})", c.building_name_zh, c.room_number, c.display_name))
            .unwrap_or_else(|| "未指定教室".to_string());
        println!(
            "  [{}] {} 第{}节  {}",
            index,
            meeting.day.name_zh(),
            meeting.period_range_label,
            location
        );
    }

    println!("{}", serde_json::to_string_pretty(&schedule)?);
    Ok(())
}

/// 冲突检测命令
pub fn conflicts_command(selection: &SelectionArgs) -> Result<()> {
    let reference = ReferenceData::load(None, selection.buildings.as_deref())?;
    let courses = load_selected_courses(selection, &reference)?;
    warn_unscheduled(&courses);

    let conflicts = detect_conflicts(&courses);
    if conflicts.is_empty() {
        println!("✓ {} 门课程之间没有时间冲突", courses.len());
        return Ok(());
    }

    println!("发现 {} 处时间冲突:", conflicts.len());
    for conflict in &conflicts {
        let periods: Vec<String> = conflict
            .overlapping_periods
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!(
            "  ✗ {} 与 {}: {} 第{}节",
            conflict.course_a,
            conflict.course_b,
            conflict.day.name_zh(),
            periods.join(",")
        );
    }

    Ok(())
}

/// 课表网格命令
pub fn grid_command(selection: &SelectionArgs, format: GridFormat) -> Result<()> {
    let reference = ReferenceData::load(None, selection.buildings.as_deref())?;
    let courses = load_selected_courses(selection, &reference)?;
    warn_unscheduled(&courses);

    let grid = build_grid(&courses, &GridOptions::default());

    match format {
        GridFormat::Json => println!("{}", serde_json::to_string_pretty(&grid)?),
        GridFormat::Text => {
            print!("{}", grid.render_text());
            for entry in grid.legend() {
                println!(
                    "  {} {} {}",
                    entry.color.as_deref().unwrap_or("-"),
                    entry.course_id,
                    entry.name
                );
            }
            for collision in grid.collisions() {
                println!(
                    "  * {} 第{}节: {}",
                    collision.day.name_zh(),
                    collision.period,
                    collision.claimants.join(", ")
                );
            }
        }
    }

    Ok(())
}

/// 导出ICS命令
pub fn export_command(
    selection: &SelectionArgs,
    export: &ExportArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let reference = ReferenceData::load(export.periods.as_deref(), selection.buildings.as_deref())?;
    let courses = load_selected_courses(selection, &reference)?;
    warn_unscheduled(&courses);

    let options = build_export_options(export)?;
    let output_file = output
        .unwrap_or_else(|| PathBuf::from(format!("timetable-{}.ics", options.term.label())));

    println!("生成ICS日历文件...");
    let exporter = IcsExporter::new(options).with_periods(reference.periods);
    let ics_content = exporter.to_icalendar(&courses)?;

    let event_count: usize = courses.iter().map(|c| c.schedule.meeting_count()).sum();
    fs::write(&output_file, ics_content)
        .with_context(|| format!("无法写入 {}", output_file.display()))?;
    println!(
        "✓ {} 门课程, {} 个日程已保存到: {}",
        courses.len(),
        event_count,
        output_file.display()
    );

    Ok(())
}

/// Google Calendar 链接命令
pub fn links_command(selection: &SelectionArgs, export: &ExportArgs) -> Result<()> {
    let reference = ReferenceData::load(export.periods.as_deref(), selection.buildings.as_deref())?;
    let courses = load_selected_courses(selection, &reference)?;
    warn_unscheduled(&courses);

    let options = build_export_options(export)?;
    let exporter = IcsExporter::new(options).with_periods(reference.periods);

    for link in exporter.google_calendar_links(&courses)? {
        println!("{} [{}] {}: {}", link.course_id, link.block_index, link.day, link.url);
    }

    Ok(())
}

/// 列出楼栋命令
pub fn building_list_command() -> Result<()> {
    let reference = ReferenceData::load(None, None)?;

    println!("楼栋映射列表:");
    for (code, building) in reference.buildings.all() {
        println!("  {} -> {} / {}", code, building.name_zh, building.name_en);
    }

    Ok(())
}

/// 查询楼栋命令
pub fn building_lookup_command(query: &str) -> Result<()> {
    let reference = ReferenceData::load(None, None)?;
    let directory = &reference.buildings;

    let building = directory.lookup(query).or_else(|| {
        directory
            .code_for_name(query)
            .and_then(|code| directory.lookup(code))
    });

    match building {
        Some(building) => {
            println!("代码: {}", building.code);
            println!("中文名称: {}", building.name_zh);
            println!("英文名称: {}", building.name_en);
        }
        None => println!("未找到楼栋: {}", query),
    }

    Ok(())
}

/// 导出楼栋映射命令
pub fn building_export_command(file: &Path) -> Result<()> {
    let reference = ReferenceData::load(None, None)?;
    let json_content = reference.buildings.export_to_json()?;

    fs::write(file, json_content)?;
    println!(
        "✓ {} 个楼栋映射已导出到: {}",
        reference.buildings.len(),
        file.display()
    );

    Ok(())
}

/// 列出作息表命令
pub fn periods_command(periods: Option<&Path>) -> Result<()> {
    let reference = ReferenceData::load(periods, None)?;

    println!("作息表:");
    for entry in reference.periods.entries() {
        println!(
            "  第{:>2}节 {}-{}",
            entry.period.get(),
            entry.start.format("%H:%M"),
            entry.end.format("%H:%M")
        );
    }

    Ok(())
}
