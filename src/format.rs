use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

/// Left-aligns `s` in a column `width` cells wide, truncating if needed.
pub fn pad_unicode(s: &str, width: usize) -> String {
    let cell = truncate_unicode(s, width);
    let fill = width.saturating_sub(cell.width());
    format!("{cell}{}", " ".repeat(fill))
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.0} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_percent(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_pick_largest_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 / 2), "1.5 GB");
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_unicode("systemd", 10), "systemd");
        assert_eq!(truncate_unicode("gnome-shell-calendar", 8), "gnome-s\u{2026}");
        assert_eq!(truncate_unicode("日本語テキスト", 5), "日本\u{2026}");
    }

    #[test]
    fn padding_fills_to_width() {
        assert_eq!(pad_unicode("sh", 5), "sh   ");
        assert_eq!(pad_unicode("日本", 5), "日本 ");
    }

    #[test]
    fn missing_percent_renders_dash() {
        assert_eq!(format_percent(Some(12.345)), "12.3");
        assert_eq!(format_percent(None), "-");
    }
}
