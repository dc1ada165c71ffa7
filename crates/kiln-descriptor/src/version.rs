//! Maven-style version ordering
//!
//! Versions such as `30.1-jre`, `3.2.2.0` or `1.0-RC1` are not semver, so
//! they are compared segment by segment instead.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Number(u64),
    Qualifier(String),
}

impl Segment {
    /// Rank of well-known qualifiers relative to a release
    fn qualifier_rank(q: &str) -> u8 {
        match q {
            "alpha" | "a" => 0,
            "beta" | "b" => 1,
            "milestone" | "m" => 2,
            "rc" | "cr" => 3,
            "snapshot" => 4,
            "" | "ga" | "final" | "release" => 5,
            "sp" => 6,
            _ => 7,
        }
    }

    fn compare(&self, other: &Segment) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.cmp(b),
            // 1.0.1 > 1.0-jre
            (Segment::Number(_), Segment::Qualifier(_)) => Ordering::Greater,
            (Segment::Qualifier(_), Segment::Number(_)) => Ordering::Less,
            (Segment::Qualifier(a), Segment::Qualifier(b)) => {
                let (ra, rb) = (Self::qualifier_rank(a), Self::qualifier_rank(b));
                ra.cmp(&rb).then_with(|| if ra == 7 { a.cmp(b) } else { Ordering::Equal })
            }
        }
    }

    /// Value used to pad the shorter version
    fn padding_for(other: &Segment) -> Segment {
        match other {
            Segment::Number(_) => Segment::Number(0),
            Segment::Qualifier(_) => Segment::Qualifier(String::new()),
        }
    }
}

fn segments(version: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut digits = false;

    let flush = |current: &mut String, digits: bool, out: &mut Vec<Segment>| {
        if current.is_empty() {
            return;
        }
        let segment = if digits {
            current
                .parse()
                .map(Segment::Number)
                .unwrap_or_else(|_| Segment::Qualifier(current.clone()))
        } else {
            Segment::Qualifier(current.to_ascii_lowercase())
        };
        out.push(segment);
        current.clear();
    };

    for c in version.chars() {
        if c == '.' || c == '-' || c == '_' {
            flush(&mut current, digits, &mut out);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        // `rc1` splits into `rc` and `1`
        if !current.is_empty() && is_digit != digits {
            flush(&mut current, digits, &mut out);
        }
        digits = is_digit;
        current.push(c);
    }
    flush(&mut current, digits, &mut out);

    // Trailing zeros and release markers do not change the version
    while let Some(last) = out.last() {
        let redundant = match last {
            Segment::Number(0) => true,
            Segment::Qualifier(q) => Segment::qualifier_rank(q) == 5,
            _ => false,
        };
        if redundant && out.len() > 1 {
            out.pop();
        } else {
            break;
        }
    }
    out
}

/// Compare two version strings
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (sa, sb) = (segments(a), segments(b));
    let len = sa.len().max(sb.len());

    for i in 0..len {
        let ordering = match (sa.get(i), sb.get(i)) {
            (Some(x), Some(y)) => x.compare(y),
            (Some(x), None) => x.compare(&Segment::padding_for(x)),
            (None, Some(y)) => Segment::padding_for(y).compare(y),
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2", "1.10", Ordering::Less)]
    #[case("1.0", "1.0.0", Ordering::Equal)]
    #[case("1.0-rc1", "1.0", Ordering::Less)]
    #[case("1.0-alpha", "1.0-beta", Ordering::Less)]
    #[case("1.0-SNAPSHOT", "1.0", Ordering::Less)]
    #[case("1.0.1", "1.0-jre", Ordering::Greater)]
    #[case("30.1-jre", "29.0-jre", Ordering::Greater)]
    #[case("3.2.2.0", "3.2.2", Ordering::Equal)]
    #[case("2.13.5", "2.13.10", Ordering::Less)]
    #[case("1.0-final", "1.0", Ordering::Equal)]
    #[case("1.0-sp1", "1.0", Ordering::Greater)]
    #[case("1.0-android", "1.0-jre", Ordering::Less)]
    fn test_compare_versions(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(compare_versions(a, b), expected, "{} vs {}", a, b);
        assert_eq!(compare_versions(b, a), expected.reverse(), "{} vs {}", b, a);
    }
}
