use crate::{Classroom, building::BuildingDirectory};

/// 使用默认楼栋目录解析教室代码，如 `"ED201[GF]"`；空输入返回 None
pub fn parse_classroom_token(raw: &str) -> Option<Classroom> {
    BuildingDirectory::global().parse_classroom(raw)
}
