//! 依賴路徑解析

use std::fmt;

/// 路徑片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// 屬性鍵
    Key(String),
    /// 陣列索引（`[0]`）
    Index(usize),
}

impl Segment {
    /// 解析括號內容：引號字串為鍵，數字為索引
    fn from_bracket(content: &str) -> Self {
        let content = content.trim();
        let quoted = content.len() >= 2
            && ((content.starts_with('"') && content.ends_with('"'))
                || (content.starts_with('\'') && content.ends_with('\'')));

        if quoted {
            return Segment::Key(content[1..content.len() - 1].to_string());
        }

        match content.parse::<usize>() {
            Ok(index) => Segment::Index(index),
            Err(_) => Segment::Key(content.to_string()),
        }
    }
}

/// 依賴路徑，例如 `name.first` 或 `items[0].id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    raw: String,
    segments: Vec<Segment>,
}

impl Path {
    /// 解析路徑
    ///
    /// 以 `.` 分隔鍵，`[..]` 表示索引或引號鍵。未閉合的 `[` 視為鍵的一部分。
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        // 剛結束 `[..]`，避免 `a[0].b` 產生空鍵
        let mut after_bracket = false;
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !(after_bracket && current.is_empty()) {
                        segments.push(Segment::Key(std::mem::take(&mut current)));
                    }
                    after_bracket = false;
                }
                '[' => {
                    let rest = chars.as_str();
                    match rest.find(']') {
                        Some(end) => {
                            if !current.is_empty() {
                                segments.push(Segment::Key(std::mem::take(&mut current)));
                            }
                            segments.push(Segment::from_bracket(&rest[..end]));
                            chars = rest[end + 1..].chars();
                            after_bracket = true;
                        }
                        None => {
                            current.push(c);
                            after_bracket = false;
                        }
                    }
                }
                _ => {
                    current.push(c);
                    after_bracket = false;
                }
            }
        }

        if !(after_bracket && current.is_empty()) {
            segments.push(Segment::Key(current));
        }

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 是否為單一鍵
    pub fn is_simple(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Key(_)])
    }
}

impl From<&str> for Path {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn key(k: &str) -> Segment {
        Segment::Key(k.to_string())
    }

    #[rstest]
    #[case("dirname", vec![key("dirname")])]
    #[case("name.first", vec![key("name"), key("first")])]
    #[case("items[0].id", vec![key("items"), Segment::Index(0), key("id")])]
    #[case("grid[1][2]", vec![key("grid"), Segment::Index(1), Segment::Index(2)])]
    #[case("map[\"a.b\"]", vec![key("map"), key("a.b")])]
    #[case("map['x']", vec![key("map"), key("x")])]
    #[case("a..b", vec![key("a"), key(""), key("b")])]
    #[case("open[", vec![key("open[")])]
    #[case("", vec![key("")])]
    fn test_parse(#[case] raw: &str, #[case] expected: Vec<Segment>) {
        let path = Path::parse(raw);
        assert_eq!(path.segments(), expected.as_slice());
        assert_eq!(path.as_str(), raw);
    }

    #[test]
    fn test_is_simple() {
        assert!(Path::from("dirname").is_simple());
        assert!(!Path::from("name.first").is_simple());
        assert!(!Path::from("[0]").is_simple());
    }
}
