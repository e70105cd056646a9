use crate::element::ElementId;

/// Base36 encoding of the creation timestamp, used as the generator seed
pub fn timestamp_seed() -> String {
    let mut millis = chrono::Utc::now().timestamp_millis().unsigned_abs();
    if millis == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while millis > 0 {
        let digit = (millis % 36) as u32;
        digits.push(std::char::from_digit(digit, 36).unwrap_or('0'));
        millis /= 36;
    }
    digits.iter().rev().collect()
}

/// Sequential ID generator for elements
///
/// Ids look like `<prefix>-<seed>-<count>`. The count only grows, and every
/// id handed out is checked against the caller's live element set, so it is
/// unique even when a document loaded from elsewhere already uses the same
/// seed.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_seed(prefix, timestamp_seed())
    }

    pub fn from_seed(prefix: impl Into<String>, seed: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate the next id not present in `exists`
    pub fn next_id(&mut self, exists: impl Fn(&ElementId) -> bool) -> ElementId {
        loop {
            self.count += 1;
            let id = ElementId::new(format!("{}-{}-{}", self.prefix, self.seed, self.count));
            if !exists(&id) {
                return id;
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::from_seed("pc", "abc");

        let id1 = gen.next_id(|_| false);
        let id2 = gen.next_id(|_| false);

        assert_eq!(id1.as_str(), "pc-abc-1");
        assert_eq!(id2.as_str(), "pc-abc-2");
    }

    #[test]
    fn test_skips_existing_ids() {
        let mut gen = IdGenerator::from_seed("pc", "abc");
        let taken: HashSet<ElementId> = ["pc-abc-1", "pc-abc-2"]
            .into_iter()
            .map(ElementId::from)
            .collect();

        let id = gen.next_id(|id| taken.contains(id));
        assert_eq!(id.as_str(), "pc-abc-3");
    }

    #[test]
    fn test_count_keeps_ids_unique() {
        let mut gen = IdGenerator::from_seed("pc", "abc");
        let ids: HashSet<ElementId> = (0..500).map(|_| gen.next_id(|_| false)).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_timestamp_seed_is_base36() {
        let seed = timestamp_seed();
        assert!(!seed.is_empty());
        assert!(seed.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
