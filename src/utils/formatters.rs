// Formatting utilities

use chrono::DateTime;

/// Format a Unix timestamp (seconds) as `YYYY-MM-DD HH:MM:SS` UTC
pub fn format_unix_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// A player UID is numeric and at least 6 digits long
pub fn is_valid_uid(uid: &str) -> bool {
    uid.len() >= 6 && uid.chars().all(|c| c.is_ascii_digit())
}

/// Format a channel id as a Discord channel mention
pub fn channel_mention(channel_id: &str) -> String {
    format!("<#{}>", channel_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_unix_timestamp() {
        assert_eq!(format_unix_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_unix_timestamp(1_700_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_is_valid_uid() {
        assert!(is_valid_uid("123456"));
        assert!(is_valid_uid("1234567890"));
        assert!(!is_valid_uid("12345"));
        assert!(!is_valid_uid("12345a"));
        assert!(!is_valid_uid(""));
        assert!(!is_valid_uid("١٢٣٤٥٦"));
    }
}
