// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Comment-preserving INI document model.
//!
//! Lines are kept verbatim; only the single line carrying an updated value is
//! rewritten by [`Document::set`]. Full-line comments start with `#` or `;`.

/// One physical line, classified once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// `[section]` header; holds the section name.
    Section(String),
    /// `key = value` pair inside the current section.
    Pair { key: String, value: String },
    /// Blank line, comment, or anything unrecognized. Preserved as-is.
    Other,
}

/// Parsed INI file that can be queried, edited in place, and serialized back
/// with comments and unrelated lines untouched.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Raw text of each line, without trailing newline.
    raw: Vec<String>,
    /// Classification parallel to `raw`.
    kinds: Vec<Line>,
}

impl Document {
    /// Parse INI text. Never fails: unrecognized lines are carried through
    /// untouched and simply invisible to lookups.
    pub fn parse(text: &str) -> Self {
        let mut raw = Vec::new();
        let mut kinds = Vec::new();
        for line in text.lines() {
            let trimmed = line.trim();
            let kind = if trimmed.starts_with('#') || trimmed.starts_with(';') || trimmed.is_empty()
            {
                Line::Other
            } else if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                Line::Section(name.trim().to_string())
            } else if let Some((key, value)) = trimmed.split_once('=') {
                Line::Pair {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                }
            } else {
                Line::Other
            };
            raw.push(line.to_string());
            kinds.push(kind);
        }
        Self { raw, kinds }
    }

    /// Look up `key` within `section`. Section and key matching is
    /// case-insensitive; the stored value is returned verbatim.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let mut in_section = false;
        for kind in &self.kinds {
            match kind {
                Line::Section(name) => in_section = name.eq_ignore_ascii_case(section),
                Line::Pair { key: k, value } if in_section && k.eq_ignore_ascii_case(key) => {
                    return Some(value);
                }
                _ => {}
            }
        }
        None
    }

    /// All `(key, value)` pairs of a section, in file order.
    pub fn pairs(&self, section: &str) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut in_section = false;
        for kind in &self.kinds {
            match kind {
                Line::Section(name) => in_section = name.eq_ignore_ascii_case(section),
                Line::Pair { key, value } if in_section => {
                    out.push((key.clone(), value.clone()));
                }
                _ => {}
            }
        }
        out
    }

    /// Section names in file order.
    pub fn section_names(&self) -> Vec<&str> {
        self.kinds
            .iter()
            .filter_map(|k| match k {
                Line::Section(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Set `section.key = value`, preserving every other line.
    ///
    /// An existing pair is rewritten in place. A missing key is appended at
    /// the end of its section (before trailing blanks). A missing section is
    /// appended at the end of the file.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let mut in_section = false;
        let mut section_end: Option<usize> = None;
        for i in 0..self.kinds.len() {
            match &self.kinds[i] {
                Line::Section(name) => {
                    if in_section {
                        // Leaving the target section without a hit.
                        break;
                    }
                    in_section = name.eq_ignore_ascii_case(section);
                    if in_section {
                        section_end = Some(i + 1);
                    }
                }
                Line::Pair { key: k, .. } if in_section => {
                    if k.eq_ignore_ascii_case(key) {
                        self.raw[i] = format!("{} = {}", key, value);
                        self.kinds[i] = Line::Pair {
                            key: key.to_string(),
                            value: value.to_string(),
                        };
                        return;
                    }
                    section_end = Some(i + 1);
                }
                _ => {
                    if in_section && !self.raw[i].trim().is_empty() {
                        section_end = Some(i + 1);
                    }
                }
            }
        }

        if in_section {
            // Section exists, key does not: insert after its last content line.
            let at = section_end.unwrap_or(self.raw.len());
            self.raw.insert(at, format!("{} = {}", key, value));
            self.kinds.insert(
                at,
                Line::Pair {
                    key: key.to_string(),
                    value: value.to_string(),
                },
            );
            return;
        }

        // Section missing entirely: append it.
        if !self.raw.is_empty() && !self.raw[self.raw.len() - 1].trim().is_empty() {
            self.raw.push(String::new());
            self.kinds.push(Line::Other);
        }
        self.raw.push(format!("[{}]", section));
        self.kinds.push(Line::Section(section.to_string()));
        self.raw.push(format!("{} = {}", key, value));
        self.kinds.push(Line::Pair {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Serialize back to INI text with a trailing newline.
    pub fn to_text(&self) -> String {
        let mut out = self.raw.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
