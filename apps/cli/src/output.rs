//! 控制台输出：每条记录一行 JSON

use anyhow::Result;
use co2mon_sdk::{GatherEvent, HistoryEntry};
use std::io::Write;

/// 写出一条采集记录
pub fn write_event<W: Write>(out: &mut W, event: &GatherEvent) -> Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// 写出历史快照（一个 JSON 数组）
pub fn write_history<W: Write>(out: &mut W, entries: &[HistoryEntry]) -> Result<()> {
    serde_json::to_writer(&mut *out, entries)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_per_event() {
        let mut buf = Vec::new();
        write_event(&mut buf, &GatherEvent::sample(800, 22.5)).unwrap();
        write_event(&mut buf, &GatherEvent::error("Failed sending key")).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"co2":800,"temperature":22.5}"#,
                r#"{"error":"Failed sending key"}"#
            ]
        );
    }

    #[test]
    fn test_history_dump() {
        let mut buf = Vec::new();
        let entries = [HistoryEntry {
            co2_ppm: 640,
            temperature_celsius: 21.5,
            age_seconds: 12,
        }];
        write_history(&mut buf, &entries).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "[{\"co2\":640,\"temp\":21.5,\"time\":12}]\n"
        );
    }
}
