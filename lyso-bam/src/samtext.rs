use crate::aux::{ArrayValue, OptionalField, OptionalValue};
use crate::model::{AlignmentRecord, SequenceField};

fn format_value(field: &OptionalField) -> String {
    match &field.value {
        OptionalValue::Char(c) => format!("A:{c}"),
        OptionalValue::Int(v) => format!("i:{v}"),
        OptionalValue::Float(v) => format!("f:{v}"),
        OptionalValue::Str(s) => format!("Z:{s}"),
        OptionalValue::Hex(s) => format!("H:{s}"),
        OptionalValue::Array(arr) => {
            let (sub, body) = match arr {
                ArrayValue::Int8(v) => ('c', v.iter().map(|x| x.to_string()).collect::<Vec<_>>()),
                ArrayValue::UInt8(v) => ('C', v.iter().map(|x| x.to_string()).collect::<Vec<_>>()),
                ArrayValue::Int16(v) => ('s', v.iter().map(|x| x.to_string()).collect::<Vec<_>>()),
                ArrayValue::UInt16(v) => ('S', v.iter().map(|x| x.to_string()).collect::<Vec<_>>()),
                ArrayValue::Int32(v) => ('i', v.iter().map(|x| x.to_string()).collect::<Vec<_>>()),
                ArrayValue::UInt32(v) => ('I', v.iter().map(|x| x.to_string()).collect::<Vec<_>>()),
                ArrayValue::Float32(v) => ('f', v.iter().map(|x| x.to_string()).collect::<Vec<_>>()),
            };
            format!("B:{sub}{}", body.iter().map(|s| format!(",{s}")).collect::<String>())
        }
    }
}

/// Renders one decoded alignment as a tab-separated SAM text line
/// (no trailing newline). `mate_name`/`own_name` let the caller collapse
/// `rnext` to `=` when it equals `rname`, per the SAM text convention.
pub fn alignment_to_sam_line(rec: &AlignmentRecord) -> String {
    let rname = rec.reference_sequence.name().unwrap_or("*").to_string();
    let rnext = match rec.next_reference_sequence.name() {
        Some(n) if Some(n) == rec.reference_sequence.name() => "=".to_string(),
        Some(n) => n.to_string(),
        None => "*".to_string(),
    };
    let cigar = if rec.cigar_operations.is_empty() {
        "*".to_string()
    } else {
        rec.cigar_operations.iter().map(|op| op.to_string()).collect()
    };
    let seq = match &rec.sequence {
        SequenceField::Str(s) => s.clone(),
        SequenceField::None => "*".to_string(),
        SequenceField::ReferenceEqual => "=".to_string(),
    };
    let qual = if rec.quality.is_empty() {
        "*".to_string()
    } else {
        rec.quality
            .iter()
            .map(|p| (p.to_int() as u8).saturating_add(33) as char)
            .collect()
    };

    let mut line = format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        rec.query_template_name,
        rec.flags.bits(),
        rname,
        rec.position.unwrap_or(0),
        rec.mapping_quality.unwrap_or(255),
        cigar,
        rnext,
        rec.next_position.unwrap_or(0),
        rec.template_length,
        seq,
        qual,
    );
    for field in &rec.optional_content {
        line.push('\t');
        line.push(field.tag[0] as char);
        line.push(field.tag[1] as char);
        line.push(':');
        line.push_str(&format_value(field));
    }
    line
}
