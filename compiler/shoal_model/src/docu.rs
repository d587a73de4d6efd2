/// A parsed documentation comment.
///
/// Accepts both raw `/** ... */` blocks and plain text. The description is
/// split into a brief first sentence and the long remainder; `@param` and
/// `@return` tags are collected separately.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DocComment {
    brief: String,
    long: String,
    params: Vec<(String, String)>,
    retval: Option<String>,
}

enum Tag {
    None,
    Param(usize),
    Return,
}

impl DocComment {
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        let text = text.strip_prefix("/**").unwrap_or(text);
        let text = text.strip_suffix("*/").unwrap_or(text);

        let lines: Vec<&str> = text
            .lines()
            .map(|line| {
                let line = line.trim_start();
                let line = line.strip_prefix('*').unwrap_or(line);
                let line = line.strip_prefix(' ').unwrap_or(line);
                line.trim_end()
            })
            .collect();

        let mut doc = DocComment::default();
        let mut description = Vec::new();
        let mut tag = Tag::None;
        let mut in_tags = false;

        for line in lines {
            if let Some(rest) = line.strip_prefix("@param") {
                in_tags = true;
                let rest = rest.trim_start();
                let (name, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                doc.params.push((name.to_string(), text.trim().to_string()));
                tag = Tag::Param(doc.params.len() - 1);
            } else if let Some(rest) = line.strip_prefix("@return") {
                in_tags = true;
                doc.retval = Some(rest.trim().to_string());
                tag = Tag::Return;
            } else if in_tags {
                if line.is_empty() {
                    tag = Tag::None;
                    continue;
                }
                let target = match tag {
                    Tag::Param(i) => doc.params.get_mut(i).map(|(_, text)| text),
                    Tag::Return => doc.retval.as_mut(),
                    Tag::None => None,
                };
                if let Some(target) = target {
                    if !target.is_empty() {
                        target.push(' ');
                    }
                    target.push_str(line);
                }
            } else {
                description.push(line);
            }
        }

        let description = description.join("\n");
        let description = description.trim();
        let brief_end = description
            .match_indices('.')
            .map(|(i, _)| i + 1)
            .find(|&end| {
                description[end..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
            });
        match brief_end {
            Some(end) => {
                doc.brief = description[..end].to_string();
                doc.long = description[end..].trim().to_string();
            }
            None => doc.brief = description.to_string(),
        }
        doc
    }

    /// The first sentence.
    pub fn brief(&self) -> &str {
        &self.brief
    }

    /// Everything after the first sentence.
    pub fn long(&self) -> &str {
        &self.long
    }

    /// Brief and long description joined.
    pub fn description(&self) -> String {
        if self.long.is_empty() {
            self.brief.clone()
        } else {
            format!("{}  {}", self.brief, self.long)
        }
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn retval(&self) -> Option<&str> {
        self.retval.as_deref()
    }
}
