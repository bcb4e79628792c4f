/// 从外部程序的一行输出中提取进度百分比（0–100）
///
/// 依次识别：
/// - `45%`、`12.5% done`
/// - `frame 3 of 10`、`7 out of 20`
/// - `3/10`
pub fn parse_progress(line: &str) -> Option<f32> {
    percent_marker(line).or_else(|| ratio(line))
}

fn clamp(value: f32) -> f32 {
    value.clamp(0.0, 100.0)
}

fn percent_marker(line: &str) -> Option<f32> {
    line.match_indices('%').find_map(|(idx, _)| {
        let head = &line[..idx];
        let start = head
            .trim_end_matches(|c: char| c.is_ascii_digit() || c == '.')
            .len();
        head[start..].parse::<f32>().ok().map(clamp)
    })
}

fn to_percent(current: u64, total: u64) -> Option<f32> {
    if total == 0 {
        return None;
    }
    Some(clamp(current as f32 / total as f32 * 100.0))
}

fn ratio(line: &str) -> Option<f32> {
    let lower = line.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '/'))
        .filter(|w| !w.is_empty())
        .collect();

    for (i, word) in words.iter().enumerate() {
        if let Some((a, b)) = word.split_once('/')
            && let (Ok(current), Ok(total)) = (a.parse::<u64>(), b.parse::<u64>())
        {
            return to_percent(current, total);
        }

        let Ok(current) = word.parse::<u64>() else {
            continue;
        };
        let total = match (words.get(i + 1), words.get(i + 2), words.get(i + 3)) {
            (Some(&"of"), Some(total), _) => total.parse::<u64>().ok(),
            (Some(&"out"), Some(&"of"), Some(total)) => total.parse::<u64>().ok(),
            _ => None,
        };
        if let Some(total) = total {
            return to_percent(current, total);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_forms() {
        assert_eq!(parse_progress("Progress: 45%"), Some(45.0));
        assert_eq!(parse_progress("12.5% done"), Some(12.5));
        assert_eq!(parse_progress("[####] 100% complete"), Some(100.0));
        assert_eq!(parse_progress("overshoot 250%"), Some(100.0));
    }

    #[test]
    fn test_ratio_forms() {
        assert_eq!(parse_progress("frame 5 of 10"), Some(50.0));
        assert_eq!(parse_progress("Processing 1 out of 4"), Some(25.0));
        assert_eq!(parse_progress("chunk 3/4 written"), Some(75.0));
    }

    #[test]
    fn test_percent_wins_over_ratio() {
        assert_eq!(parse_progress("item 1/4 (80%)"), Some(80.0));
    }

    #[test]
    fn test_no_progress() {
        assert_eq!(parse_progress("starting encoder"), None);
        assert_eq!(parse_progress("100 % spaced"), None);
        assert_eq!(parse_progress("0 of 0"), None);
        assert_eq!(parse_progress("date 2024/01/02"), None);
    }
}
