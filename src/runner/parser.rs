//! 输出清理

/// 清理工具输出中的 ANSI 转义序列和控制字符
///
/// msgfmt / xgettext 在终端下可能带颜色输出，捕获后统一剥离。
pub fn clean_terminal_output(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            c if c.is_control() && c != '\t' => {}
            _ => result.push(c),
        }
    }

    result
}
