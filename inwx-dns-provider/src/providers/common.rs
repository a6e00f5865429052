//! Provider 公共工具函数

// ============ 域名名称处理 ============

/// 去掉域名末尾的点
/// 如: "example.com." -> "example.com"
pub fn normalize_domain_name(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// 将完整域名转换为相对名称
/// 如: "www.example.com" + "example.com." -> "www"
/// 如: "example.com" + "example.com." -> "@"
///
/// Comparison ignores ASCII case; names outside the zone are returned as-is.
pub fn full_name_to_relative(full_name: &str, zone_name: &str) -> String {
    let full = normalize_domain_name(full_name);
    let zone = normalize_domain_name(zone_name);

    if full.is_empty() || full.eq_ignore_ascii_case(&zone) {
        return "@".to_string();
    }

    let suffix_len = zone.len() + 1;
    if full.len() > suffix_len {
        let split = full.len() - suffix_len;
        if full.is_char_boundary(split) {
            let (label, suffix) = full.split_at(split);
            if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(&zone) {
                return label.to_string();
            }
        }
    }

    full
}

/// 将相对名称转换为完整域名
/// 如: "www" + "example.com." -> "www.example.com"
/// 如: "@" + "example.com." -> "example.com"
pub fn relative_to_full_name(relative_name: &str, zone_name: &str) -> String {
    let zone = normalize_domain_name(zone_name);

    if relative_name == "@" || relative_name.is_empty() {
        zone
    } else {
        format!("{relative_name}.{zone}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_dot() {
        assert_eq!(normalize_domain_name("example.com."), "example.com");
        assert_eq!(normalize_domain_name("example.com"), "example.com");
    }

    #[test]
    fn full_to_relative() {
        assert_eq!(full_name_to_relative("www.example.com", "example.com."), "www");
        assert_eq!(
            full_name_to_relative("_sip._tcp.test_4.example.com", "example.com."),
            "_sip._tcp.test_4"
        );
        assert_eq!(full_name_to_relative("example.com", "example.com."), "@");
        assert_eq!(full_name_to_relative("WWW.Example.COM", "example.com."), "WWW");
    }

    #[test]
    fn full_to_relative_outside_zone() {
        assert_eq!(full_name_to_relative("www.other.org", "example.com."), "www.other.org");
        assert_eq!(full_name_to_relative("notexample.com", "example.com."), "notexample.com");
    }

    #[test]
    fn relative_to_full() {
        assert_eq!(relative_to_full_name("www", "example.com."), "www.example.com");
        assert_eq!(relative_to_full_name("@", "example.com."), "example.com");
        assert_eq!(relative_to_full_name("", "example.com"), "example.com");
    }
}
