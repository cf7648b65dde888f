//! Minimal RFC-4180 reader for the flattened patient export.
//!
//! The `_json` columns embed stringified JSON arrays, so fields routinely
//! contain commas, doubled quotes, and newlines — quote handling has to be
//! exact. Input is bounded (one export file), so the whole text is parsed
//! into owned records up front; no streaming.

/// Split CSV text into records of fields per RFC 4180.
///
/// Quoted fields may contain commas, CRLF/LF line breaks, and doubled
/// quotes (`""` → `"`). A trailing newline does not produce an empty
/// record. A UTF-8 BOM on the first field is stripped.
pub fn parse_records(input: &str) -> Vec<Vec<String>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();
    // Whether the current record has seen any character at all; an empty
    // line between records yields a single-empty-field record, which the
    // loader later treats as blank.
    let mut started = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                started = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                started = true;
            }
            '\r' => {
                // Swallow the LF of a CRLF pair; bare CR also ends the record.
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                started = false;
            }
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                started = false;
            }
            _ => {
                field.push(c);
                started = true;
            }
        }
    }

    if started || !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

/// True when every cell of a record is blank after trimming.
pub fn is_blank_record(record: &[String]) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields() {
        let records = parse_records("a,b,c\nd,e,f\n");
        assert_eq!(records, vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
    }

    #[test]
    fn quoted_field_with_commas() {
        let records = parse_records("id,notes\nP1,\"one, two, three\"\n");
        assert_eq!(records[1], vec!["P1", "one, two, three"]);
    }

    #[test]
    fn doubled_quotes_unescape() {
        let records = parse_records("P1,\"say \"\"hi\"\"\"\n");
        assert_eq!(records[0][1], "say \"hi\"");
    }

    #[test]
    fn embedded_json_survives() {
        let json = r#"[{"date":"2023-01-01","size_mm":12.5}]"#;
        let line = format!("P1,\"{}\"\n", json.replace('"', "\"\""));
        let records = parse_records(&line);
        assert_eq!(records[0][1], json);
    }

    #[test]
    fn newline_inside_quotes() {
        let records = parse_records("P1,\"line one\nline two\"\nP2,x\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][1], "line one\nline two");
    }

    #[test]
    fn crlf_line_endings() {
        let records = parse_records("a,b\r\nc,d\r\n");
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn trailing_newline_adds_no_record() {
        assert_eq!(parse_records("a,b\n").len(), 1);
        assert_eq!(parse_records("a,b").len(), 1);
    }

    #[test]
    fn bom_is_stripped() {
        let records = parse_records("\u{feff}id,name\n");
        assert_eq!(records[0][0], "id");
    }

    #[test]
    fn empty_line_is_blank_record() {
        let records = parse_records("a,b\n\nc,d\n");
        assert_eq!(records.len(), 3);
        assert!(is_blank_record(&records[1]));
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        assert!(is_blank_record(&[" ".to_string(), "\t".to_string()]));
        assert!(!is_blank_record(&["".to_string(), "x".to_string()]));
    }
}
