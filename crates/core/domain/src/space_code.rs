//! 车位编码规则：`A-01` … `Z-99`。

use std::collections::HashSet;

const MAX_NUMBER: u32 = 99;

/// 校验编码格式：一个大写字母、连字符、两位数字（01–99）。
pub fn is_valid_space_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.len() != 4 {
        return false;
    }
    if !bytes[0].is_ascii_uppercase() || bytes[1] != b'-' {
        return false;
    }
    if !bytes[2].is_ascii_digit() || !bytes[3].is_ascii_digit() {
        return false;
    }
    let number = u32::from(bytes[2] - b'0') * 10 + u32::from(bytes[3] - b'0');
    (1..=MAX_NUMBER).contains(&number)
}

/// 所有合法编码，按 A-01, A-02, …, A-99, B-01, … 顺序。
pub fn all_space_codes() -> impl Iterator<Item = String> {
    (b'A'..=b'Z').flat_map(|letter| {
        (1..=MAX_NUMBER).map(move |number| format!("{}-{:02}", letter as char, number))
    })
}

/// 第一个未被占用的编码；全部用尽时返回 None。
pub fn next_space_code(existing: &HashSet<String>) -> Option<String> {
    all_space_codes().find(|code| !existing.contains(code))
}

/// 依次取 `count` 个未被占用的编码（可能不足 `count` 个）。
pub fn next_space_codes(existing: &HashSet<String>, count: usize) -> Vec<String> {
    all_space_codes()
        .filter(|code| !existing.contains(code))
        .take(count)
        .collect()
}
