use crate::error::HeaderError;

/// Sort order declared by an `@HD` line's `SO` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Unknown,
    Unsorted,
    Queryname,
    Coordinate,
}

impl SortOrder {
    fn parse(s: &str) -> Self {
        match s {
            "unsorted" => SortOrder::Unsorted,
            "queryname" => SortOrder::Queryname,
            "coordinate" => SortOrder::Coordinate,
            _ => SortOrder::Unknown,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Unknown => "unknown",
            SortOrder::Unsorted => "unsorted",
            SortOrder::Queryname => "queryname",
            SortOrder::Coordinate => "coordinate",
        }
    }
}

/// One structured line of SAM header text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    Hd {
        version: String,
        sort_order: SortOrder,
        extra: Vec<(String, String)>,
    },
    Sq {
        ref_name: String,
        ref_length: u32,
        extra: Vec<(String, String)>,
    },
    /// Any other tag group (`RG`, `PG`, ...), kept verbatim as an
    /// ordered tag list.
    Other {
        tag: String,
        fields: Vec<(String, String)>,
    },
    Comment(String),
}

fn parse_tag_fields(rest: &str) -> Vec<(String, String)> {
    rest.split('\t')
        .filter(|f| !f.is_empty())
        .filter_map(|f| f.split_once(':').map(|(k, v)| (k.to_string(), v.to_string())))
        .collect()
}

fn parse_line(line: &str) -> HeaderLine {
    let mut parts = line.splitn(2, '\t');
    let tag_token = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("");
    let tag = tag_token.strip_prefix('@').unwrap_or(tag_token);

    if tag == "CO" {
        return HeaderLine::Comment(rest.to_string());
    }

    let fields = parse_tag_fields(rest);
    match tag {
        "HD" => {
            let mut version = String::new();
            let mut sort_order = SortOrder::Unknown;
            let mut extra = Vec::new();
            for (k, v) in fields {
                match k.as_str() {
                    "VN" => version = v,
                    "SO" => sort_order = SortOrder::parse(&v),
                    _ => extra.push((k, v)),
                }
            }
            HeaderLine::Hd {
                version,
                sort_order,
                extra,
            }
        }
        "SQ" => {
            let mut ref_name = String::new();
            let mut ref_length = 0u32;
            let mut extra = Vec::new();
            for (k, v) in fields {
                match k.as_str() {
                    "SN" => ref_name = v,
                    "LN" => ref_length = v.parse().unwrap_or(0),
                    _ => extra.push((k, v)),
                }
            }
            HeaderLine::Sq {
                ref_name,
                ref_length,
                extra,
            }
        }
        other => HeaderLine::Other {
            tag: other.to_string(),
            fields,
        },
    }
}

/// Parses SAM header text (as extracted verbatim from the BAM header
/// block) into an ordered sequence of structured lines. Empty lines
/// are ignored. The first non-`@CO` line, if any, must be `@HD`.
pub fn parse_header_text(text: &str) -> Result<Vec<HeaderLine>, HeaderError> {
    let mut out = Vec::new();
    let mut seen_non_comment = false;
    for (idx, raw_line) in text.split('\n').enumerate() {
        if raw_line.is_empty() {
            continue;
        }
        let is_comment = raw_line.starts_with("@CO");
        if !seen_non_comment && !is_comment {
            if !raw_line.starts_with("@HD") {
                return Err(HeaderError::HeaderLineNotFirst(idx));
            }
            seen_non_comment = true;
        }
        out.push(parse_line(raw_line));
    }
    Ok(out)
}

/// Emits a sequence of structured header lines back to SAM header
/// text, one tab-separated line per entry, each newline-terminated.
pub fn emit_header_text(lines: &[HeaderLine]) -> String {
    let mut out = String::new();
    for line in lines {
        match line {
            HeaderLine::Hd {
                version,
                sort_order,
                extra,
            } => {
                out.push_str("@HD");
                if !version.is_empty() {
                    out.push_str(&format!("\tVN:{version}"));
                }
                out.push_str(&format!("\tSO:{}", sort_order.as_str()));
                for (k, v) in extra {
                    out.push_str(&format!("\t{k}:{v}"));
                }
            }
            HeaderLine::Sq {
                ref_name,
                ref_length,
                extra,
            } => {
                out.push_str(&format!("@SQ\tSN:{ref_name}\tLN:{ref_length}"));
                for (k, v) in extra {
                    out.push_str(&format!("\t{k}:{v}"));
                }
            }
            HeaderLine::Other { tag, fields } => {
                out.push_str(&format!("@{tag}"));
                for (k, v) in fields {
                    out.push_str(&format!("\t{k}:{v}"));
                }
            }
            HeaderLine::Comment(text) => {
                out.push_str("@CO");
                if !text.is_empty() {
                    out.push('\t');
                    out.push_str(text);
                }
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hd_sq_rg_co() {
        let text = "@HD\tVN:1.6\tSO:coordinate\n@SQ\tSN:chr1\tLN:248956422\n@RG\tID:rg1\tSM:sample1\n@CO\tgenerated for testing\n";
        let lines = parse_header_text(text).unwrap();
        assert_eq!(
            lines[0],
            HeaderLine::Hd {
                version: "1.6".to_string(),
                sort_order: SortOrder::Coordinate,
                extra: vec![],
            }
        );
        assert_eq!(
            lines[1],
            HeaderLine::Sq {
                ref_name: "chr1".to_string(),
                ref_length: 248956422,
                extra: vec![],
            }
        );
        assert_eq!(
            lines[2],
            HeaderLine::Other {
                tag: "RG".to_string(),
                fields: vec![
                    ("ID".to_string(), "rg1".to_string()),
                    ("SM".to_string(), "sample1".to_string()),
                ],
            }
        );
        assert_eq!(lines[3], HeaderLine::Comment("generated for testing".to_string()));
    }

    #[test]
    fn rejects_non_hd_first_line() {
        let text = "@SQ\tSN:chr1\tLN:100\n";
        assert_eq!(parse_header_text(text), Err(HeaderError::HeaderLineNotFirst(0)));
    }

    #[test]
    fn comments_before_hd_are_allowed() {
        let text = "@CO\tpreamble\n@HD\tVN:1.6\n";
        assert!(parse_header_text(text).is_ok());
    }

    #[test]
    fn empty_header_text_is_fine() {
        assert_eq!(parse_header_text("").unwrap(), vec![]);
    }

    #[test]
    fn emit_round_trips_core_fields() {
        let lines = vec![
            HeaderLine::Hd {
                version: "1.6".to_string(),
                sort_order: SortOrder::Coordinate,
                extra: vec![],
            },
            HeaderLine::Sq {
                ref_name: "chr1".to_string(),
                ref_length: 100,
                extra: vec![],
            },
        ];
        let text = emit_header_text(&lines);
        let reparsed = parse_header_text(&text).unwrap();
        assert_eq!(reparsed, lines);
    }
}
