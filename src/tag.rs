//! Tag records from `git tag -l --format=$%(refname)$%(objectname)$%(*objectname)`

/// Format string that produces the records [`parse_tags`] understands
pub const TAG_FORMAT: &str = "$%(refname)$%(objectname)$%(*objectname)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// Commit the tag points at (peeled for annotated tags)
    pub sha: String,
}

impl Tag {
    /// Parse one record. Lightweight tags carry two fields, annotated tags
    /// three (the last one being the peeled commit).
    pub fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('$').filter(|s| !s.is_empty()).collect();
        let (refname, sha) = match fields.as_slice() {
            [refname, sha] => (*refname, *sha),
            [refname, _, peeled] => (*refname, *peeled),
            _ => return None,
        };

        let name = refname.strip_prefix("refs/tags/")?;
        if name.is_empty() {
            return None;
        }

        Some(Tag {
            name: name.to_string(),
            sha: sha.trim().to_string(),
        })
    }
}

/// Parse a tag listing, skipping malformed records
pub fn parse_tags(output: &str) -> Vec<Tag> {
    output.lines().filter_map(Tag::parse).collect()
}
