use std::ffi::{OsStr, OsString};
use std::path::Path;

use super::ProcessError;

/// 模板中允许出现的占位符
pub const PLACEHOLDERS: &[&str] = &["{program}", "{input}", "{output_dir}", "{output_file}"];

/// 一次外部程序调用：程序和参数，不经过 shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// 用于日志和确认对话框的命令行文本
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|arg| quote_for_display(&arg.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_for_display(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\' | '$' | '`'));
    if needs_quotes {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

/// 按空白切分模板，支持单引号、双引号和反斜杠转义
///
/// 单引号内不处理转义；双引号内只有 `\"` 和 `\\` 被转义。
///
/// # Errors
///
/// 引号未闭合时返回错误。
pub fn split_template(template: &str) -> Result<Vec<String>, ProcessError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => {
                            return Err(ProcessError::InvalidTemplate(
                                "unterminated single quote".into(),
                            ));
                        }
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') if matches!(chars.peek(), Some('"') | Some('\\')) => {
                            if let Some(escaped) = chars.next() {
                                current.push(escaped);
                            }
                        }
                        Some(ch) => current.push(ch),
                        None => {
                            return Err(ProcessError::InvalidTemplate(
                                "unterminated double quote".into(),
                            ));
                        }
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// 找出形如 `{name}` 但不在 [`PLACEHOLDERS`] 中的占位符
fn unknown_placeholders(word: &str) -> Vec<String> {
    let mut unknown = Vec::new();
    let mut rest = word;
    while let Some(start) = rest.find('{') {
        let after = &rest[start..];
        let Some(end) = after.find('}') else { break };
        let candidate = &after[..=end];
        let name = &candidate[1..candidate.len() - 1];
        if !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !PLACEHOLDERS.contains(&candidate)
        {
            unknown.push(candidate.to_string());
        }
        rest = &after[end + 1..];
    }
    unknown
}

/// 检查命令模板
///
/// 空模板表示使用默认调用方式，总是合法。非空模板必须包含 `{input}`，
/// 只能使用已知占位符，并且引号要配对。
pub fn validate_template(template: &str) -> Result<(), ProcessError> {
    if template.trim().is_empty() {
        return Ok(());
    }

    let words = split_template(template)?;
    if !words.iter().any(|w| w.contains("{input}")) {
        return Err(ProcessError::InvalidTemplate(
            "template must contain {input}".into(),
        ));
    }

    let unknown: Vec<String> = words.iter().flat_map(|w| unknown_placeholders(w)).collect();
    if !unknown.is_empty() {
        return Err(ProcessError::InvalidTemplate(format!(
            "unknown placeholder(s): {}",
            unknown.join(", ")
        )));
    }
    Ok(())
}

fn substitute(word: &str, values: &[(&str, &OsStr)]) -> OsString {
    // 整个参数就是占位符时直接使用原始路径，保留非 UTF-8 字节
    if let Some((_, value)) = values.iter().find(|(key, _)| *key == word) {
        return value.to_os_string();
    }
    // 从左到右扫描一次，替换进来的路径文本不再参与匹配
    let mut text = String::with_capacity(word.len());
    let mut rest = word;
    while !rest.is_empty() {
        match values.iter().find(|(key, _)| rest.starts_with(key)) {
            Some((key, value)) => {
                text.push_str(&value.to_string_lossy());
                rest = &rest[key.len()..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    text.push(c);
                }
                rest = chars.as_str();
            }
        }
    }
    OsString::from(text)
}

/// 构造对单个文件的调用
///
/// 无模板时为 `program input output_dir`；有模板时按模板切分并替换占位符，
/// 模板第一个词是要执行的程序。
pub fn build_invocation(
    program: &Path,
    template: Option<&str>,
    input: &Path,
    output_dir: &Path,
    output_file: &Path,
) -> Result<Invocation, ProcessError> {
    let template = template.map(str::trim).filter(|t| !t.is_empty());

    let Some(template) = template else {
        return Ok(Invocation {
            program: program.as_os_str().to_os_string(),
            args: vec![
                input.as_os_str().to_os_string(),
                output_dir.as_os_str().to_os_string(),
            ],
        });
    };

    validate_template(template)?;
    let values: [(&str, &OsStr); 4] = [
        ("{program}", program.as_os_str()),
        ("{input}", input.as_os_str()),
        ("{output_dir}", output_dir.as_os_str()),
        ("{output_file}", output_file.as_os_str()),
    ];

    let mut words = split_template(template)?
        .into_iter()
        .map(|word| substitute(&word, &values));

    let program = words
        .next()
        .ok_or_else(|| ProcessError::InvalidTemplate("template is empty".into()))?;
    Ok(Invocation {
        program,
        args: words.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn os(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_split_template_handles_quotes_and_escapes() {
        let words = split_template(r#"conv -i "{input}" --title 'a b' x\ y "q\"t""#).unwrap();
        assert_eq!(
            words,
            vec!["conv", "-i", "{input}", "--title", "a b", "x y", "q\"t"]
        );
    }

    #[test]
    fn test_split_template_keeps_empty_quoted_word() {
        assert_eq!(split_template(r#"prog "" end"#).unwrap(), vec!["prog", "", "end"]);
    }

    #[test]
    fn test_split_template_unterminated_quote() {
        assert!(matches!(
            split_template("prog 'oops"),
            Err(ProcessError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("").is_ok());
        assert!(validate_template("{program} {input} {output_dir}").is_ok());
        assert!(validate_template("{program} {output_dir}").is_err());
        assert!(validate_template("{program} {input} {env}").is_err());
        assert!(validate_template(r#"tool --json '{"k": 1}' {input}"#).is_ok());
    }

    #[test]
    fn test_build_default_invocation() {
        let inv = build_invocation(
            Path::new("/bin/conv"),
            None,
            Path::new("/in/a file.txt"),
            Path::new("/out"),
            Path::new("/out/a file_processed.txt"),
        )
        .unwrap();

        assert_eq!(inv.program, OsString::from("/bin/conv"));
        assert_eq!(inv.args, os(&["/in/a file.txt", "/out"]));
        assert_eq!(inv.display(), "/bin/conv '/in/a file.txt' /out");
    }

    #[test]
    fn test_build_template_invocation_substitutes_placeholders() {
        let inv = build_invocation(
            Path::new("/usr/bin/ffmpeg"),
            Some("{program} -y -i {input} {output_dir}/x.mp4 {output_file}"),
            Path::new("/in/clip.mov"),
            Path::new("/out"),
            Path::new("/out/clip_processed.mov"),
        )
        .unwrap();

        assert_eq!(inv.program, OsString::from("/usr/bin/ffmpeg"));
        assert_eq!(
            inv.args,
            os(&["-y", "-i", "/in/clip.mov", "/out/x.mp4", "/out/clip_processed.mov"])
        );
    }

    #[test]
    fn test_placeholder_text_inside_input_path_is_kept() {
        let inv = build_invocation(
            Path::new("/bin/conv"),
            Some("{program} --in={input} --out={output_file}"),
            Path::new("/in/{output_dir}.txt"),
            Path::new("/out"),
            Path::new("/out/x_processed.txt"),
        )
        .unwrap();

        assert_eq!(
            inv.args,
            os(&["--in=/in/{output_dir}.txt", "--out=/out/x_processed.txt"])
        );
    }

    #[test]
    fn test_template_may_name_program_literally() {
        let inv = build_invocation(
            Path::new("/ignored"),
            Some("python3 script.py {input}"),
            &PathBuf::from("/in/a.csv"),
            Path::new("/out"),
            Path::new("/out/a_processed.csv"),
        )
        .unwrap();

        assert_eq!(inv.program, OsString::from("python3"));
        assert_eq!(inv.args, os(&["script.py", "/in/a.csv"]));
    }

    #[test]
    fn test_blank_template_falls_back_to_default() {
        let inv = build_invocation(
            Path::new("/bin/conv"),
            Some("   "),
            Path::new("/in/a.txt"),
            Path::new("/out"),
            Path::new("/out/a_processed.txt"),
        )
        .unwrap();
        assert_eq!(inv.args, os(&["/in/a.txt", "/out"]));
    }
}
