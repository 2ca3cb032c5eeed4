/// One decoded FASTQ record: the four logical fields carried by a
/// four-line record, all kept as plain strings (§3: "all plain
/// strings").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FastqItem {
    /// The text of the `@` line after stripping the leading `@`.
    pub name: String,
    pub sequence: String,
    /// The text of the `+` line after stripping the leading `+`.
    /// Conventionally empty, but kept verbatim when present.
    pub comment: String,
    pub qualities: String,
}

impl FastqItem {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>, comment: impl Into<String>, qualities: impl Into<String>) -> Self {
        FastqItem {
            name: name.into(),
            sequence: sequence.into(),
            comment: comment.into(),
            qualities: qualities.into(),
        }
    }
}
