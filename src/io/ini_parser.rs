// Hand-rolled INI parser for the master deck. Sections in square
// brackets, key = value properties, # and ; comments. A non-blank line
// inside a section that carries no '=' continues the previous property's
// value, so long breakpoint lists can wrap. Line numbers are kept so
// deck errors can point at their source.

#[derive(Debug, Clone)]
pub struct IniProperty {
    pub key: String,
    pub value: String,
    pub line_number: usize,
}

#[derive(Debug, Clone)]
pub struct IniSection {
    pub name: String,
    pub line_number: usize,
    pub properties: Vec<IniProperty>,
}

impl IniSection {
    pub fn get(&self, key: &str) -> Option<&IniProperty> {
        self.properties.iter().find(|p| p.key == key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    pub sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn parse(content: &str) -> Result<IniDocument, String> {
        let mut doc = IniDocument::default();

        for (idx, raw_line) in content.lines().enumerate() {
            let line_number = idx + 1;
            let trimmed = raw_line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if trimmed.starts_with('[') {
                if !trimmed.ends_with(']') {
                    return Err(format!(
                        "Unterminated section header on line {}: '{}'",
                        line_number, trimmed
                    ));
                }
                let name = trimmed[1..trimmed.len() - 1].trim().to_string();
                if name.is_empty() {
                    return Err(format!("Empty section name on line {}", line_number));
                }
                doc.sections.push(IniSection {
                    name,
                    line_number,
                    properties: Vec::new(),
                });
                continue;
            }

            let section = doc.sections.last_mut().ok_or_else(|| {
                format!(
                    "Property outside any section on line {}: '{}'",
                    line_number, trimmed
                )
            })?;

            if let Some(eq) = trimmed.find('=') {
                let key = trimmed[..eq].trim().to_string();
                let value = strip_inline_comment(&trimmed[eq + 1..]).trim().to_string();
                if key.is_empty() {
                    return Err(format!("Property with empty key on line {}", line_number));
                }
                section.properties.push(IniProperty {
                    key,
                    value,
                    line_number,
                });
            } else {
                //continuation of the previous property's value
                let continued = strip_inline_comment(trimmed).trim().to_string();
                match section.properties.last_mut() {
                    Some(prop) => {
                        if !prop.value.is_empty() && !prop.value.ends_with(',') {
                            prop.value.push(' ');
                        }
                        prop.value.push_str(&continued);
                    }
                    None => {
                        return Err(format!(
                            "Continuation line {} has no property to continue: '{}'",
                            line_number, trimmed
                        ))
                    }
                }
            }
        }

        Ok(doc)
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// All sections named `prefix.N`, sorted by N. The numbering must be
    /// contiguous from 1.
    pub fn numbered_sections(&self, prefix: &str) -> Result<Vec<&IniSection>, String> {
        let mut found: Vec<(usize, &IniSection)> = Vec::new();
        for s in &self.sections {
            if let Some(rest) = s.name.strip_prefix(prefix) {
                if let Some(number) = rest.strip_prefix('.') {
                    let n: usize = number.parse().map_err(|_| {
                        format!(
                            "Section '[{}]' on line {}: '{}' is not a number",
                            s.name, s.line_number, number
                        )
                    })?;
                    found.push((n, s));
                }
            }
        }
        found.sort_by_key(|(n, _)| *n);
        for (i, (n, s)) in found.iter().enumerate() {
            if *n != i + 1 {
                return Err(format!(
                    "Sections '[{}.N]' must be numbered contiguously from 1; found [{}] on line {}",
                    prefix, s.name, s.line_number
                ));
            }
        }
        Ok(found.into_iter().map(|(_, s)| s).collect())
    }
}

fn strip_inline_comment(value: &str) -> &str {
    //a comment marker inside a value only counts when preceded by space
    let bytes = value.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'#' || b == b';') && (i == 0 || bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
            return &value[..i];
        }
    }
    value
}
