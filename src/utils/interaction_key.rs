use once_cell::sync::Lazy;
use regex::Regex;

static KEY_UNSAFE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9_\-]").unwrap()
});

/// 将任意标识符转换为文档键安全的片段，每个非法字符替换为 `_`
pub fn sanitize_key_part(raw: &str) -> String {
    KEY_UNSAFE_REGEX.replace_all(raw, "_").into_owned()
}

/// 由 (item_id, user_id) 推导交互记录的文档键
///
/// 结果格式为 `{item}_{user}`，两部分都先经过 [`sanitize_key_part`] 处理。
/// 清洗后相同的两组输入（例如只在被替换的标点上不同）会得到同一个键，
/// 这是已知且接受的限制：它们共享同一条记录。
pub fn derive_interaction_key(item_id: &str, user_id: &str) -> String {
    format!("{}_{}", sanitize_key_part(item_id), sanitize_key_part(user_id))
}
