//! `application/x-www-form-urlencoded` 编码
//!
//! 与 Flowdock API 期望的格式逐字节一致：空格编码为 `+`，
//! 字母、数字和 `-_.*` 原样保留，其余 UTF-8 字节编码为大写 `%HH`。

/// 表单编码器
pub struct FormEncoder;

impl FormEncoder {
    /// 按输入顺序编码 `(name, value)` 对，空值仍输出 `name=`
    pub fn encode<K, V>(pairs: &[(K, V)]) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in pairs {
            serializer.append_pair(name.as_ref(), value.as_ref());
        }
        serializer.finish()
    }
}

/// 编码单个字段
pub fn encode_component(input: &str, out: &mut String) {
    out.extend(form_urlencoded::byte_serialize(input.as_bytes()));
}
