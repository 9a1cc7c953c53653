mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "timetable-ics")]
#[command(about = "课程时间编码解析与课表导出工具")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 启用详细日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// 课程目录与选课参数
#[derive(Args, Clone)]
pub struct SelectionArgs {
    /// 课程目录JSON文件（CourseRecord 数组）
    #[arg(short, long)]
    pub input: PathBuf,

    /// 选中的课程ID，逗号分隔，按选课顺序；缺省为全部课程
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// 楼栋映射JSON文件
    #[arg(long)]
    pub buildings: Option<PathBuf>,
}

/// 日历导出参数
#[derive(Args, Clone)]
pub struct ExportArgs {
    /// 日历名称
    #[arg(long)]
    pub calendar_name: Option<String>,

    /// 学年起始年份，如 2024
    #[arg(long)]
    pub year: Option<u32>,

    /// 学期 (1: 秋季, 2: 春季)
    #[arg(long)]
    pub semester: Option<u32>,

    /// 学期周数
    #[arg(long)]
    pub weeks: Option<u32>,

    /// 提醒时间（分钟），0 表示不提醒
    #[arg(long, default_value = "10")]
    pub reminder_minutes: u32,

    /// 作息表JSON文件
    #[arg(long)]
    pub periods: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GridFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// 解析单个课程时间编码，如 "M56R2-ED201[GF]"
    Parse {
        /// 原始编码
        raw: String,
    },

    /// 检测已选课程的时间冲突
    Conflicts {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// 生成一周课表网格
    Grid {
        #[command(flatten)]
        selection: SelectionArgs,

        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text")]
        format: GridFormat,
    },

    /// 导出ICS文件
    Export {
        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        export: ExportArgs,

        /// 输出文件路径
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 输出每次上课的 Google Calendar 链接
    Links {
        #[command(flatten)]
        selection: SelectionArgs,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// 楼栋映射相关命令
    Buildings {
        #[command(subcommand)]
        action: BuildingCommands,
    },

    /// 列出作息表
    Periods {
        /// 作息表JSON文件
        #[arg(long)]
        periods: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BuildingCommands {
    /// 列出所有楼栋
    List,

    /// 按代码或名称查询楼栋
    Lookup {
        /// 楼栋代码或中英文名称
        query: String,
    },

    /// 导出楼栋映射到JSON文件
    Export {
        /// 输出文件路径
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 设置日志级别
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "timetable_ics_cli={},timetable_ics_core={}",
                    log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Parse { raw } => commands::parse_command(&raw),
        Commands::Conflicts { selection } => commands::conflicts_command(&selection),
        Commands::Grid { selection, format } => commands::grid_command(&selection, format),
        Commands::Export {
            selection,
            export,
            output,
        } => commands::export_command(&selection, &export, output),
        Commands::Links { selection, export } => commands::links_command(&selection, &export),
        Commands::Buildings { action } => match action {
            BuildingCommands::List => commands::building_list_command(),
            BuildingCommands::Lookup { query } => commands::building_lookup_command(&query),
            BuildingCommands::Export { file } => commands::building_export_command(&file),
        },
        Commands::Periods { periods } => commands::periods_command(periods.as_deref()),
    }
}
