use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

lazy_static! {
    /// Splits a name into alternating runs of digits and non-digits, e.g. "*1.002" -> ["*", "1", ".", "002"]
    static ref NAME_TOKEN_REGEX: Regex = Regex::new(r"[0-9]+|[^0-9]+").unwrap();
}

/// Orders allele names for reporting and tie-breaking
pub trait AlleleNameComparator {
    /// Compares two allele display names
    fn compare(&self, name1: &str, name2: &str) -> Ordering;
}

/// Numeric-aware ordering that puts reference labels first.
/// "*2" sorts before "*10", and "Reference" sorts before everything else.
#[derive(Clone, Debug)]
pub struct NaturalNameComparator {
    /// Lower-cased names that always sort first
    reference_labels: Vec<String>
}

impl Default for NaturalNameComparator {
    fn default() -> Self {
        Self {
            reference_labels: vec!["reference".to_string()]
        }
    }
}

impl NaturalNameComparator {
    /// Creates a comparator with a custom set of reference labels
    /// # Arguments
    /// * `reference_labels` - names that always sort first, compared case-insensitively
    pub fn new(reference_labels: &[&str]) -> NaturalNameComparator {
        NaturalNameComparator {
            reference_labels: reference_labels.iter().map(|l| l.to_lowercase()).collect()
        }
    }

    fn is_reference_label(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.reference_labels.iter().any(|l| *l == lowered)
    }
}

impl AlleleNameComparator for NaturalNameComparator {
    fn compare(&self, name1: &str, name2: &str) -> Ordering {
        if name1 == name2 {
            return Ordering::Equal;
        }

        match (self.is_reference_label(name1), self.is_reference_label(name2)) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        };

        let tokens1: Vec<&str> = NAME_TOKEN_REGEX.find_iter(name1).map(|m| m.as_str()).collect();
        let tokens2: Vec<&str> = NAME_TOKEN_REGEX.find_iter(name2).map(|m| m.as_str()).collect();
        for (t1, t2) in tokens1.iter().zip(tokens2.iter()) {
            let ordering = compare_tokens(t1, t2);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        // shared prefix, shorter name first and then plain ordering to stay total
        tokens1.len().cmp(&tokens2.len())
            .then_with(|| name1.cmp(name2))
    }
}

/// Compares a single pair of name tokens, digit runs compare by value and come before text
fn compare_tokens(t1: &str, t2: &str) -> Ordering {
    let numeric1 = t1.bytes().all(|b| b.is_ascii_digit());
    let numeric2 = t2.bytes().all(|b| b.is_ascii_digit());
    match (numeric1, numeric2) {
        (true, true) => {
            // compare by magnitude without parsing, so long digit runs cannot overflow
            let v1 = t1.trim_start_matches('0');
            let v2 = t2.trim_start_matches('0');
            v1.len().cmp(&v2.len())
                .then_with(|| v1.cmp(v2))
        },
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            t1.to_lowercase().cmp(&t2.to_lowercase())
                .then_with(|| t1.cmp(t2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let comparator = NaturalNameComparator::default();
        let mut names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        names.sort_by(|a, b| comparator.compare(a, b));
        names
    }

    #[test]
    fn test_star_alleles() {
        assert_eq!(
            sorted(&["*10", "*2", "*1.002", "*1", "*1.001", "Reference"]),
            vec!["Reference", "*1", "*1.001", "*1.002", "*2", "*10"]
        );
    }

    #[test]
    fn test_hgvs_names() {
        assert_eq!(
            sorted(&["c.3067C>A", "c.1129-5923C>G", "c.62G>A", "Reference"]),
            vec!["Reference", "c.62G>A", "c.1129-5923C>G", "c.3067C>A"]
        );
    }

    #[test]
    fn test_custom_reference_labels() {
        let comparator = NaturalNameComparator::new(&["*38"]);
        assert_eq!(comparator.compare("*38", "*1"), Ordering::Less);
        assert_eq!(comparator.compare("*2", "*38"), Ordering::Greater);
        assert_eq!(comparator.compare("*2", "*2"), Ordering::Equal);
        // leading zeros tie numerically but the ordering stays total
        assert_ne!(comparator.compare("*01", "*1"), Ordering::Equal);
    }
}
