/// NUL-separated map strings, addressed by index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapText {
    strings: Vec<String>,
}

impl MapText {
    pub fn parse(bytes: &[u8]) -> Self {
        let body = bytes.strip_suffix(&[0]).unwrap_or(bytes);
        if body.is_empty() {
            return Self::default();
        }
        let strings = body
            .split(|&b| b == 0)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .collect();
        Self { strings }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_nul() {
        let text = MapText::parse(b"Welcome\0A locked door\0\0Last\0");
        assert_eq!(text.len(), 4);
        assert_eq!(text.get(1), Some("A locked door"));
        assert_eq!(text.get(2), Some(""));
        assert_eq!(text.get(3), Some("Last"));
        assert_eq!(text.get(4), None);
    }

    #[test]
    fn empty_file_has_no_strings() {
        assert!(MapText::parse(&[]).is_empty());
        assert!(MapText::parse(&[0]).is_empty());
    }
}
